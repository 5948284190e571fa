//! Menu descriptions exchanged with hosted script, and the selection
//! messages they produce.
//!
//! The native menu widgets themselves belong to the window layer; this
//! module only parses the compact spec strings and maps a chosen item back
//! to a [`MenuSelection`].

use crate::codec::{InvokePayload, MenuSelection, Sequence};

/// Parent reported for context menu selections.
pub const CONTEXT_MENU_PARENT: &str = "contextMenu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Separator,
    Action {
        title: String,
        accelerator: Option<String>,
    },
}

impl MenuItem {
    fn from_parts(title: &str, accelerator: &str) -> Self {
        if title.contains("---") {
            return MenuItem::Separator;
        }
        let accelerator = accelerator.trim();
        MenuItem::Action {
            title: title.trim().to_string(),
            accelerator: (!accelerator.is_empty()).then(|| accelerator.to_string()),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            MenuItem::Separator => None,
            MenuItem::Action { title, .. } => Some(title),
        }
    }
}

// =============================================================================
// CONTEXT MENU
// =============================================================================

/// A popup menu built from `Title:Accel_---_Title:Accel`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextMenu {
    items: Vec<MenuItem>,
}

impl ContextMenu {
    pub fn parse(spec: &str) -> Self {
        let items = spec
            .split('_')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let (title, accel) = item.split_once(':').unwrap_or((item, ""));
                MenuItem::from_parts(title, accel)
            })
            .collect();
        Self { items }
    }

    /// Build from the pairs carried by a `contextMenu` Invoke.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let items = pairs
            .iter()
            .map(|(title, accel)| MenuItem::from_parts(title, accel))
            .collect();
        Self { items }
    }

    /// Build from an Invoke payload; JSON objects are flattened in key order.
    pub fn from_payload(payload: &InvokePayload) -> Option<Self> {
        payload.to_pairs().ok().map(|pairs| Self::from_pairs(&pairs))
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Titles of the selectable items, in display order.
    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().filter_map(MenuItem::title).collect()
    }

    /// Map a 1-based choice among selectable items (separators skipped) to
    /// the selection message. `0` means the menu was dismissed.
    pub fn select(&self, choice: usize, sequence: Sequence, state: &str) -> Option<MenuSelection> {
        let title = self.titles().get(choice.checked_sub(1)?)?.to_string();
        Some(MenuSelection {
            sequence: Some(sequence),
            title,
            parent: CONTEXT_MENU_PARENT.to_string(),
            state: state.to_string(),
        })
    }
}

// =============================================================================
// SYSTEM MENU
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: String,
    pub items: Vec<MenuItem>,
}

/// A menu bar built from `Title:\n Item: key + Modifier\n ---; Title: ...`.
///
/// Menus are separated by `;`, lines by a newline or `%%`. The first line is
/// the menu title. `_` as an accelerator means none. Selectable items get
/// ids counting up from 0 across the whole bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemMenu {
    menus: Vec<Menu>,
}

impl SystemMenu {
    pub fn parse(spec: &str) -> Self {
        let spec = spec.replace("%%", "\n");
        let menus = spec
            .split(';')
            .filter_map(|block| {
                let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());
                let header = lines.next()?;
                let title = header.split(':').next().unwrap_or(header).trim().to_string();
                let items = lines
                    .map(|line| {
                        let (title, accel) = line.split_once(':').unwrap_or((line, ""));
                        let accel = normalize_accelerator(accel).unwrap_or_default();
                        MenuItem::from_parts(title, &accel)
                    })
                    .collect();
                Some(Menu { title, items })
            })
            .collect();
        Self { menus }
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    /// Resolve an item id to `(title, parent menu title)`.
    pub fn lookup(&self, id: usize) -> Option<(&str, &str)> {
        self.menus
            .iter()
            .flat_map(|menu| {
                menu.items
                    .iter()
                    .filter_map(MenuItem::title)
                    .map(move |title| (title, menu.title.as_str()))
            })
            .nth(id)
    }

    /// Selection broadcast for item `id`.
    pub fn select(&self, id: usize) -> Option<MenuSelection> {
        let (title, parent) = self.lookup(id)?;
        Some(MenuSelection {
            sequence: None,
            title: title.to_string(),
            parent: parent.to_string(),
            state: String::new(),
        })
    }
}

/// Normalize `key + Modifier` into display form, e.g. `q + CommandOrControl`
/// becomes `Ctrl+q` and `S + Command` becomes `Shift+Ctrl+S`.
pub fn normalize_accelerator(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "_" {
        return None;
    }

    let mut parts = raw.split('+').map(str::trim);
    let key = parts.next().filter(|k| !k.is_empty())?;
    let shift = key.len() == 1 && key.chars().all(|c| c.is_ascii_uppercase());

    let mut accel = match parts.next().filter(|m| !m.is_empty()) {
        Some(modifier) => format!("{modifier}+{key}")
            .replace("CommandOrControl", "Ctrl")
            .replace("Command", "Ctrl")
            .replace("Control", "Ctrl"),
        None => key.to_string(),
    };
    if shift {
        accel = format!("Shift+{accel}");
    }
    Some(accel)
}

// =============================================================================
// TESTS
// =============================================================================
