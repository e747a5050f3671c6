//! Text renderers for tool results.
//!
//! The output format is part of the tool contract and must stay stable:
//!
//! ```text
//! Found 2 regions:
//!
//! ID: us-east
//! Label: Newark, NJ
//!
//! ID: us-west
//! Label: Fremont, CA
//! ```
//!
//! Detail views start with `<Category> Details:` followed by one
//! `Key: value` pair per line. Optional values and empty sections are left
//! out. Timestamps are printed exactly as the upstream delivered them.

use std::fmt::Display;

/// Owner shown when a resource is not attached to anything.
pub const UNASSIGNED: &str = "Unassigned";

/// Lines of one rendered item.
#[derive(Debug, Default)]
pub struct Block {
    lines: Vec<String>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Key: value`.
    pub fn field(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.lines.push(format!("{key}: {value}"));
        self
    }

    /// `Key: value`, skipped for `None` and empty strings.
    pub fn optional<V: Display>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.lines.push(format!("{key}: {value}"));
            }
        }
        self
    }

    /// `Key: a, b, c`, skipped when empty.
    pub fn list(&mut self, key: &str, values: &[String]) -> &mut Self {
        if !values.is_empty() {
            self.lines.push(format!("{key}: {}", values.join(", ")));
        }
        self
    }

    /// A `Title:` line followed by indented entries, skipped when empty.
    pub fn section(&mut self, title: &str, entries: impl IntoIterator<Item = String>) -> &mut Self {
        let entries: Vec<String> = entries.into_iter().collect();
        if !entries.is_empty() {
            self.lines.push(format!("{title}:"));
            self.lines
                .extend(entries.into_iter().map(|entry| format!("  {entry}")));
        }
        self
    }

    fn into_text(self) -> String {
        self.lines.join("\n")
    }
}

/// Items that appear in list results.
pub trait ListItem {
    fn render_item(&self, block: &mut Block);
}

/// Items that have a detail view.
pub trait DetailItem {
    /// Heading word, e.g. `Instance` for `Instance Details:`.
    const CATEGORY: &'static str;

    fn render_detail(&self, block: &mut Block);
}

/// `Found N <category>:` followed by one block per item.
pub fn render_list<T: ListItem>(category: &str, items: &[T]) -> String {
    let mut out = format!("Found {} {category}:", items.len());
    for item in items {
        let mut block = Block::new();
        item.render_item(&mut block);
        out.push_str("\n\n");
        out.push_str(&block.into_text());
    }
    out
}

/// `<Category> Details:` followed by the item's fields.
pub fn render_detail<T: DetailItem>(item: &T) -> String {
    let mut block = Block::new();
    item.render_detail(&mut block);
    let body = block.into_text();
    if body.is_empty() {
        format!("{} Details:", T::CATEGORY)
    } else {
        format!("{} Details:\n{body}", T::CATEGORY)
    }
}

/// The owning instance, or `Unassigned`.
pub fn owner(id: Option<u64>) -> String {
    match id {
        Some(id) if id > 0 => id.to_string(),
        _ => UNASSIGNED.to_string(),
    }
}

pub fn visibility(public: bool) -> &'static str {
    if public { "Public" } else { "Private" }
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thing {
        id: u64,
        name: &'static str,
        note: Option<&'static str>,
        tags: Vec<String>,
    }

    impl ListItem for Thing {
        fn render_item(&self, block: &mut Block) {
            block.field("ID", self.id).field("Name", self.name);
        }
    }

    impl DetailItem for Thing {
        const CATEGORY: &'static str = "Thing";

        fn render_detail(&self, block: &mut Block) {
            block
                .field("ID", self.id)
                .optional("Note", self.note)
                .list("Tags", &self.tags)
                .section("Extras", self.tags.iter().map(|t| format!("- {t}")));
        }
    }

    fn things() -> Vec<Thing> {
        vec![
            Thing {
                id: 1,
                name: "one",
                note: None,
                tags: vec![],
            },
            Thing {
                id: 2,
                name: "two",
                note: Some("hello"),
                tags: vec!["a".into(), "b".into()],
            },
        ]
    }

    #[test]
    fn test_list_format() {
        assert_eq!(
            render_list("things", &things()),
            "Found 2 things:\n\nID: 1\nName: one\n\nID: 2\nName: two"
        );
    }

    #[test]
    fn test_empty_list_is_header_only() {
        assert_eq!(render_list::<Thing>("things", &[]), "Found 0 things:");
    }

    #[test]
    fn test_detail_omits_empty_sections() {
        let things = things();
        assert_eq!(render_detail(&things[0]), "Thing Details:\nID: 1");
        assert_eq!(
            render_detail(&things[1]),
            "Thing Details:\nID: 2\nNote: hello\nTags: a, b\nExtras:\n  - a\n  - b"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let things = things();
        assert_eq!(render_list("things", &things), render_list("things", &things));
    }

    #[test]
    fn test_conventions() {
        assert_eq!(owner(None), "Unassigned");
        assert_eq!(owner(Some(0)), "Unassigned");
        assert_eq!(owner(Some(101)), "101");
        assert_eq!(visibility(true), "Public");
        assert_eq!(visibility(false), "Private");
    }
}
