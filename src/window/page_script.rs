use crate::resolver::VirtualScheme;

/// Script injected into every document of the main webview before page scripts run.
/// Publishes the scheme base URLs as `window.__WEBDESK_SCHEMES__`.
pub fn page_script() -> String {
    let schemes = VirtualScheme::ALL
        .iter()
        .map(|scheme| format!("{}: '{}'", scheme.as_str(), scheme.base_url()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"(function () {{
  if (window.__webdeskHost) return;
  window.__webdeskHost = true;
  window.__WEBDESK_SCHEMES__ = Object.freeze({{ {schemes} }});

  function send(channel) {{
    var internals = window.__TAURI_INTERNALS__;
    if (!internals) return false;
    internals.invoke('control_send', {{ message: {{ channel: channel }} }}).catch(function () {{
      location.reload();
    }});
    return true;
  }}

  document.addEventListener('contextmenu', function (event) {{
    event.preventDefault();
  }});

  document.addEventListener('keydown', function (event) {{
    var key = event.key;
    var reload = key === 'F5' || ((event.ctrlKey || event.metaKey) && (key === 'r' || key === 'R'));
    if (!reload) return;
    event.preventDefault();
    if (!send('{reload}')) location.reload();
  }});

  window.addEventListener('DOMContentLoaded', function () {{
    if (!document.fonts || !document.fonts.load) return;
    document.fonts.ready.then(function () {{
      document.fonts.forEach(function (face) {{
        face.load().catch(function () {{}});
      }});
    }});
  }});
}})();
"#,
        reload = "window-reload",
        schemes = schemes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ControlMessage;

    #[test]
    fn test_script_uses_control_channel_names() {
        let script = page_script();
        assert!(script.contains("'control_send'"));
        assert!(script.contains(ControlMessage::WindowReload.channel()));
        assert!(script.contains("contextmenu"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn test_script_publishes_platform_scheme_urls() {
        let script = page_script();
        for scheme in VirtualScheme::ALL {
            let entry = format!("{}: '{}'", scheme.as_str(), scheme.base_url());
            assert!(script.contains(&entry), "missing {}", entry);
        }
    }
}
