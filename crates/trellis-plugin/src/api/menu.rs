//! Menu-tree helpers for `auth_session_data` filters.
//!
//! Session data is `{"user": ..., "menu": [item, ...]}` where each item is a
//! [`MenuItem`]. Plugins add to it inside a filter callback and return the
//! whole value; the first plugin to mention a group creates it, later ones
//! append.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use trellis_core::{AppError, AppResult};

/// Key holding the menu array in session data.
pub const MENU_KEY: &str = "menu";

/// One menu entry. Groups are entries with children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Unique id, e.g. `grp-tools`.
    pub id: String,
    /// Label.
    pub title: String,
    /// Target URL, absent for groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Child entries.
    #[serde(default)]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    /// Creates a group entry.
    pub fn group(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            url: None,
            icon: None,
            children: Vec::new(),
        }
    }

    /// Creates a link entry.
    pub fn link(id: &str, title: &str, url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::group(id, title)
        }
    }

    /// Sets the icon.
    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }
}

/// Builds the initial session value for a user.
pub fn session_seed(user: Value) -> Value {
    json!({ "user": user, MENU_KEY: [] })
}

fn menu_mut(session: &mut Value) -> AppResult<&mut Vec<Value>> {
    let object: &mut Map<String, Value> = session
        .as_object_mut()
        .ok_or_else(|| AppError::validation("Session data must be a JSON object"))?;

    let menu = object
        .entry(MENU_KEY)
        .or_insert_with(|| Value::Array(Vec::new()));
    if menu.is_null() {
        *menu = Value::Array(Vec::new());
    }
    menu.as_array_mut()
        .ok_or_else(|| AppError::validation("Session menu must be a JSON array"))
}

/// Creates the group if no entry with its id exists yet.
///
/// Returns the index of the group in the menu.
pub fn ensure_group(session: &mut Value, group: &MenuItem) -> AppResult<usize> {
    let menu = menu_mut(session)?;
    if let Some(index) = menu
        .iter()
        .position(|item| item.get("id").and_then(Value::as_str) == Some(group.id.as_str()))
    {
        return Ok(index);
    }
    menu.push(serde_json::to_value(group)?);
    Ok(menu.len() - 1)
}

/// Appends a child to an existing group.
pub fn append_child(session: &mut Value, group_id: &str, child: &MenuItem) -> AppResult<()> {
    let menu = menu_mut(session)?;
    let group = menu
        .iter_mut()
        .find(|item| item.get("id").and_then(Value::as_str) == Some(group_id))
        .ok_or_else(|| AppError::not_found(format!("Menu group '{group_id}' not found")))?;

    let group = group
        .as_object_mut()
        .ok_or_else(|| AppError::validation(format!("Menu group '{group_id}' is not an object")))?;
    let children = group
        .entry("children")
        .or_insert_with(|| Value::Array(Vec::new()));
    if children.is_null() {
        *children = Value::Array(Vec::new());
    }
    children
        .as_array_mut()
        .ok_or_else(|| AppError::validation(format!("Menu group '{group_id}' children must be an array")))?
        .push(serde_json::to_value(child)?);
    Ok(())
}

/// Ensures the group exists, then appends the child. Returns the session.
pub fn add_to_group(mut session: Value, group: &MenuItem, child: &MenuItem) -> AppResult<Value> {
    ensure_group(&mut session, group)?;
    append_child(&mut session, &group.id, child)?;
    Ok(session)
}

/// Reads the menu back as typed items.
pub fn menu_items(session: &Value) -> AppResult<Vec<MenuItem>> {
    match session.get(MENU_KEY) {
        Some(menu) => Ok(serde_json::from_value(menu.clone())?),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_hooks::{ClosureHandler, HookArgs, HookBus, HookPoint};

    fn tools() -> MenuItem {
        MenuItem::group("grp-tools", "Tools")
    }

    fn menu_plugin(bus: &mut HookBus, plugin: &'static str) {
        bus.register(
            HookPoint::AuthSessionData,
            ClosureHandler::filter(plugin, "menu", move |session, _| {
                let child = MenuItem::link(plugin, plugin, &format!("/{plugin}"));
                add_to_group(session, &tools(), &child)
            })
            .into_handler(),
        );
    }

    #[test]
    fn test_two_plugins_share_one_group() {
        let mut bus = HookBus::default();
        menu_plugin(&mut bus, "audit");
        menu_plugin(&mut bus, "pageviews");

        let session = bus
            .run_filter(
                HookPoint::AuthSessionData,
                session_seed(json!({"id": 1})),
                HookArgs::new(),
            )
            .unwrap();

        let menu = menu_items(&session).unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].id, "grp-tools");
        let children: Vec<&str> = menu[0].children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(children, vec!["audit", "pageviews"]);
    }

    #[test]
    fn test_ensure_group_keeps_existing_title() {
        let mut session = session_seed(Value::Null);
        ensure_group(&mut session, &MenuItem::group("grp-tools", "First")).unwrap();
        let index = ensure_group(&mut session, &MenuItem::group("grp-tools", "Second")).unwrap();

        assert_eq!(index, 0);
        assert_eq!(menu_items(&session).unwrap()[0].title, "First");
    }

    #[test]
    fn test_append_to_missing_group_fails() {
        let mut session = session_seed(Value::Null);
        let err = append_child(&mut session, "grp-none", &MenuItem::link("x", "X", "/x")).unwrap_err();
        assert!(err.message.contains("grp-none"));
    }

    #[test]
    fn test_session_without_menu_gets_one() {
        let session = add_to_group(json!({}), &tools(), &MenuItem::link("a", "A", "/a")).unwrap();
        assert_eq!(menu_items(&session).unwrap()[0].children.len(), 1);
        assert!(add_to_group(json!([]), &tools(), &MenuItem::link("a", "A", "/a")).is_err());
    }
}
