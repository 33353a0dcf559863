use crate::catalog::ExampleCatalog;

pub const TITLE: &str = "✈️ Foreign Object Debris (FoD) Detection";
pub const DESCRIPTION: &str = "Upload an image or select a sample image to detect foreign objects.";
pub const INPUT_LABEL: &str = "Upload Image for FoD Detection";
pub const OUTPUT_LABEL: &str = "Detected Objects";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1100px; padding: 24px; color: #1f2937; }
h1 { margin-bottom: 4px; }
.panels { display: flex; gap: 24px; flex-wrap: wrap; }
.panel { flex: 1 1 420px; border: 1px solid #d1d5db; border-radius: 8px; padding: 16px; }
.panel img { max-width: 100%; display: block; margin-top: 12px; }
#status { margin-top: 12px; color: #b91c1c; white-space: pre-wrap; }
.gallery { display: flex; flex-wrap: wrap; gap: 12px; margin-top: 12px; }
.gallery button { border: 1px solid #d1d5db; border-radius: 6px; background: #fff; padding: 4px; cursor: pointer; }
.gallery img { width: 120px; height: 90px; object-fit: cover; display: block; }
"#;

const SCRIPT: &str = r#"
const output = document.getElementById('output');
const preview = document.getElementById('preview');
const statusBox = document.getElementById('status');

async function showResult(response) {
  output.removeAttribute('src');
  statusBox.textContent = '';
  const type = response.headers.get('content-type') || '';
  if (response.ok && type.startsWith('image/')) {
    output.src = URL.createObjectURL(await response.blob());
    return;
  }
  const body = await response.json().catch(() => ({ message: response.statusText }));
  statusBox.textContent = body.message || 'Error';
}

document.getElementById('upload').addEventListener('submit', async (event) => {
  event.preventDefault();
  const file = document.getElementById('image').files[0];
  if (!file) { return; }
  preview.src = URL.createObjectURL(file);
  const form = new FormData();
  form.append('image', file);
  statusBox.textContent = 'Detecting...';
  await showResult(await fetch('/api/detect', { method: 'POST', body: form }));
});

document.querySelectorAll('.gallery button').forEach((button) => {
  button.addEventListener('click', async () => {
    preview.src = button.dataset.image;
    statusBox.textContent = 'Detecting...';
    await showResult(await fetch(button.dataset.detect, { method: 'POST' }));
  });
});
"#;

/// Minimal HTML escaping for text and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_gallery(catalog: &ExampleCatalog) -> String {
    if catalog.is_empty() {
        return String::from("<p>No examples available.</p>");
    }

    let buttons: Vec<String> = catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(id, entry)| {
            let name = escape_html(&entry.name);
            format!(
                r#"<button type="button" title="{name}" data-image="/examples/{id}/image" data-detect="/api/examples/{id}/detect"><img src="/examples/{id}/image" alt="{name}"><span>{name}</span></button>"#
            )
        })
        .collect();

    format!(r#"<div class="gallery">{}</div>"#, buttons.join(""))
}

/// Render the single-page UI
pub fn render_index(catalog: &ExampleCatalog) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<h1>{title}</h1>
<p>{description}</p>
<div class="panels">
  <section class="panel">
    <h2>{input_label}</h2>
    <form id="upload">
      <input type="file" id="image" name="image" accept="image/*">
      <button type="submit">Detect</button>
    </form>
    <img id="preview" alt="">
  </section>
  <section class="panel">
    <h2>{output_label}</h2>
    <div id="status"></div>
    <img id="output" alt="">
  </section>
</div>
<h2>Examples</h2>
{gallery}
<script>{script}</script>
</body>
</html>
"#,
        title = escape_html(TITLE),
        style = STYLE,
        description = escape_html(DESCRIPTION),
        input_label = escape_html(INPUT_LABEL),
        output_label = escape_html(OUTPUT_LABEL),
        gallery = render_gallery(catalog),
        script = SCRIPT,
    )
}
