use baltimare_shared::{INITIAL_USERS_ELEMENT_ID, Region, UpdateMode, UserRecord, parse_users_payload};

/// Everything the server embeds into the index page for the first paint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bootstrap {
    pub users: Vec<UserRecord>,
    pub update_mode: UpdateMode,
    pub region: Region,
}

/// Read the server-rendered snapshot. A missing or malformed snapshot starts empty.
pub fn read_bootstrap() -> Bootstrap {
    let Some(element) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(INITIAL_USERS_ELEMENT_ID))
    else {
        return Bootstrap::default();
    };

    let users = match parse_initial_users(element.text_content().as_deref()) {
        Ok(users) => users,
        Err(e) => {
            web_sys::console::warn_1(&format!("initial user snapshot unreadable: {e}").into());
            Vec::new()
        }
    };

    Bootstrap {
        users,
        update_mode: element
            .get_attribute("data-update-mode")
            .and_then(|raw| UpdateMode::parse(&raw))
            .unwrap_or_default(),
        region: element
            .get_attribute("data-region")
            .and_then(|raw| Region::parse(&raw))
            .unwrap_or_default(),
    }
}

fn parse_initial_users(text: Option<&str>) -> Result<Vec<UserRecord>, serde_json::Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => parse_users_payload(json),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_initial_users;

    #[test]
    fn empty_element_means_empty_list() {
        assert!(parse_initial_users(None).expect("none is empty").is_empty());
        assert!(parse_initial_users(Some("  \n")).expect("blank is empty").is_empty());
        assert!(parse_initial_users(Some("[]")).expect("empty list").is_empty());
    }

    #[test]
    fn escaped_server_snapshot_parses() {
        let text = r#"[{"id":"r","username":"Rarity <\/b>","online":false,"minutes":300,"lastSeen":"2024-10-01T08:00:00Z","traits":[]}]"#;
        let users = parse_initial_users(Some(text)).expect("snapshot should parse");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "Rarity </b>");
    }

    #[test]
    fn malformed_snapshot_is_an_error() {
        assert!(parse_initial_users(Some("[{")).is_err());
    }
}
