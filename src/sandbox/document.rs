//! The page a frame loads: runtime libraries, the stop/resume listener and the
//! generated code inside a guarded script block.

pub const P5JS_CDN: &str = "https://cdnjs.cloudflare.com/ajax/libs/p5.js/1.9.3/p5.min.js";
pub const P5JS_SOUND_CDN: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/p5.js/1.9.3/addons/p5.sound.min.js";

pub const STOP_SIGNAL: &str = "stop";
pub const RESUME_SIGNAL: &str = "resume";

const SKETCH_ERROR_LOG: &str = "Sketch error:";
const CONSOLE_ERROR_PREFIX: &str = "Error: ";
const CONSOLE_ERROR_SUFFIX: &str =
    "Check the browser console for details or ask the assistant to fix it.";

const STYLE: &str = r#"
      body {
        margin: 0;
        overflow: hidden;
        display: flex;
        justify-content: center;
        align-items: center;
        height: 100vh;
        background: linear-gradient(135deg, #0f172a 0%, #1e293b 100%);
        font-family: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
      }
      main { display: flex; justify-content: center; align-items: center; }
      .console {
        position: absolute;
        bottom: 0;
        left: 0;
        right: 0;
        background: rgba(239, 68, 68, 0.95);
        color: white;
        padding: 1rem 1.5rem;
        font-family: 'JetBrains Mono', monospace;
        font-size: 0.9rem;
        line-height: 1.5;
      }"#;

/// Render the full document for `code`. The code is embedded verbatim.
pub fn render_document(code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>p5.js sketch</title>
    <style>{STYLE}
    </style>
    <script src="{P5JS_CDN}"></script>
    <script src="{P5JS_SOUND_CDN}"></script>
    <script>
      window.addEventListener('message', (event) => {{
        if (event.data === '{STOP_SIGNAL}' && typeof noLoop === 'function') {{
          noLoop();
          console.log('Sketch stopped (noLoop)');
        }} else if (event.data === '{RESUME_SIGNAL}' && typeof loop === 'function') {{
          loop();
          console.log('Sketch resumed (loop)');
        }}
      }}, false);
    </script>
  </head>
  <body>
    <script>
      try {{
{code}
      }} catch (error) {{
        console.error("{SKETCH_ERROR_LOG}", error);
        parent.postMessage(JSON.stringify({{ message: error.toString() }}), '*');
        document.body.innerHTML = `
          <div class="console">
            <strong>{CONSOLE_ERROR_PREFIX}${{error.message}}</strong>
            <br>
            <small>{CONSOLE_ERROR_SUFFIX}</small>
          </div>`;
      }}
    </script>
  </body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_embeds_code_verbatim_inside_guard() {
        let code = "function setup(){createCanvas(200,200)} // `quoted` {braces}";
        let document = render_document(code);

        let try_pos = document.find("try {").unwrap();
        let code_pos = document.find(code).unwrap();
        let catch_pos = document.find("} catch (error) {").unwrap();
        assert!(try_pos < code_pos && code_pos < catch_pos);
    }

    #[test]
    fn test_document_loads_runtime_and_listens_for_signals() {
        let document = render_document("");
        assert!(document.contains(P5JS_CDN));
        assert!(document.contains(P5JS_SOUND_CDN));
        assert!(document.contains("event.data === 'stop'"));
        assert!(document.contains("event.data === 'resume'"));
        assert!(document.contains("JSON.stringify({ message: error.toString() })"));
    }
}
