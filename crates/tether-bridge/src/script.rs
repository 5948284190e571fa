//! Script injected into, and evaluated in, the hosted page.
//!
//! [`RUNTIME_SCRIPT`] installs the hosted-script half of the bridge: the
//! `window._ipc` pending-call table with its sequence counter, the Invoke
//! encoder, and the settlement entry points the native side evaluates.
//! Each binding then gets a one-line stub from [`binding_stub`].
//!
//! Strings interpolated into script are always emitted as JSON string
//! literals so quotes, backticks and `${` in payloads cannot escape.

use serde_json::Value;
use tether_common::CodecError;

use crate::codec::{self, ControlMessage, MenuSelection, CONTEXT_MENU_BINDING};
use crate::correlator::INITIAL_SEQUENCE;

/// Event broadcast for menu clicks that settle no call.
pub const MENU_EVENT: &str = "menuItemSelected";

/// Event broadcast when the system theme changes.
pub const THEME_EVENT: &str = "themeChanged";

/// Document-start runtime. Idempotent: a second evaluation is a no-op.
pub const RUNTIME_SCRIPT: &str = r#"
(function () {
  if (window.__tether) return;

  // Every engine ends up behind window.external.invoke.
  const external = window.external = window.external || {};
  if (typeof external.invoke !== 'function') {
    external.invoke = (s) => window.ipc.postMessage(s);
  }

  const IPC = window._ipc = (window._ipc || { nextSeq: __INITIAL_SEQUENCE__ });

  const toBase64 = (text) => {
    let bin = '';
    for (const b of new TextEncoder().encode(text)) bin += String.fromCharCode(b);
    return btoa(bin);
  };

  const fromBase64 = (encoded) => {
    const bytes = Uint8Array.from(atob(encoded), (c) => c.charCodeAt(0));
    return new TextDecoder().decode(bytes);
  };

  // Remove and return a pending call, or null if it was never created
  // or has already settled.
  const take = (seq) => {
    const pending = IPC[seq];
    if (!pending || typeof pending.resolve !== 'function') return null;
    delete IPC[seq];
    return pending;
  };

  window.__tether = {
    call(name, value) {
      const seq = IPC.nextSeq++;
      const promise = new Promise((resolve, reject) => {
        IPC[seq] = { resolve, reject };
      });

      let encoded;
      if (name === __CONTEXT_MENU__) {
        encoded = Object.entries(value || {})
          .map((entry) => entry.join(':'))
          .join('_');
      } else {
        try {
          encoded = toBase64(JSON.stringify(value));
        } catch (err) {
          delete IPC[seq];
          return Promise.reject(err);
        }
      }

      window.external.invoke(`ipc;${seq};${name};${encoded}`);
      return promise;
    },

    resolve(wire) {
      const data = String(wire).trim().split(';');
      const internal = data[0] === 'internal';
      const status = Number(data[1]);
      const seq = Number(data[2]);
      const pending = take(seq);
      if (!pending) return;

      const method = status === 0 ? 'resolve' : 'reject';
      const raw = data.slice(3).join(';');
      if (internal) {
        pending[method](raw);
        return;
      }

      let value;
      try {
        value = JSON.parse(fromBase64(raw));
      } catch (err) {
        pending.reject(new Error(`unable to decode result of call ${seq}: ${err.message}`));
        return;
      }
      pending[method](value);
    },

    emit(name, encoded) {
      let detail;
      try {
        detail = encoded === undefined ? undefined : JSON.parse(fromBase64(encoded));
      } catch (err) {
        console.error(`unable to parse detail of event ${name}: ${err.message}`);
        return;
      }
      window.dispatchEvent(new window.CustomEvent(name, { detail }));
    },

    menu(seq, detail) {
      if (seq > 0) {
        const pending = take(seq);
        if (pending) pending.resolve(detail);
        return;
      }
      window.dispatchEvent(new window.CustomEvent(__MENU_EVENT__, { detail }));
    },
  };
})();
"#;

/// The runtime with its constants filled in.
pub fn runtime() -> String {
    RUNTIME_SCRIPT
        .replace("__INITIAL_SEQUENCE__", &INITIAL_SEQUENCE.to_string())
        .replace("__CONTEXT_MENU__", &js_string(CONTEXT_MENU_BINDING))
        .replace("__MENU_EVENT__", &js_string(MENU_EVENT))
}

/// Stub exposing `window[name]` as a promise-returning call.
pub fn binding_stub(name: &str) -> String {
    let name = js_string(name);
    format!(
        "(function () {{ const name = {name}; \
         window[name] = (value) => window.__tether.call(name, value); }})();"
    )
}

/// Render a native -> script message as a statement to evaluate.
pub fn render(message: &ControlMessage) -> Result<String, CodecError> {
    let js = match message {
        ControlMessage::Invoke(invoke) => {
            let wire = codec::encode_invoke(invoke.sequence, &invoke.name, &invoke.payload)?;
            format!("window.external.invoke({});", js_string(&wire))
        }
        ControlMessage::Resolve(resolve) => {
            let wire = codec::encode_resolve(resolve);
            format!("window.__tether.resolve({});", js_string(&wire))
        }
        ControlMessage::Event(event) => match &event.detail {
            Some(detail) => format!(
                "window.__tether.emit({}, {});",
                js_string(&event.name),
                js_string(&codec::encode_text(detail))
            ),
            None => format!("window.__tether.emit({});", js_string(&event.name)),
        },
        ControlMessage::MenuSelection(selection) => render_menu(selection),
    };
    Ok(js)
}

fn render_menu(selection: &MenuSelection) -> String {
    let detail = serde_json::json!({
        "title": selection.title,
        "parent": selection.parent,
        "state": selection.state,
    });
    format!(
        "window.__tether.menu({}, {});",
        selection.settles().unwrap_or(0),
        detail
    )
}

/// Quote `s` as a JavaScript string literal.
pub fn js_string(s: &str) -> String {
    // JSON strings are valid JS literals except for these two separators.
    Value::String(s.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

// =============================================================================
// TESTS
// =============================================================================
