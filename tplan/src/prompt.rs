//! Prompt construction for tool selection.
//!
//! ```rust
//! use tplan::build_messages;
//! use ttooling::math::{add_spec, subtract_spec};
//! use ttooling::Catalog;
//!
//! let catalog = Catalog::from_specs(vec![add_spec(), subtract_spec()]);
//! let messages = build_messages(&catalog, "What is 5 plus 7?");
//!
//! assert_eq!(messages.len(), 2);
//! assert!(messages[0].content.contains("- add:"));
//! assert_eq!(messages[1].content, "What is 5 plus 7?");
//! ```

use tprovider::Message;
use ttooling::{Catalog, ToolSpec};

pub const SYSTEM_INSTRUCTIONS: &str = "You select exactly one tool for the user's request.\n\
Respond with a single JSON object and nothing else: no prose, no explanation.\n\
The object must have the shape {\"tool_name\": \"<name>\", \"arguments\": {<parameter>: <value>}}.\n\
Use only tool names and parameter names listed below. Numeric parameters take JSON numbers.\n\
If no listed tool fits the request, respond with {\"tool_name\": null, \"arguments\": {}}.";

pub fn render_tool(spec: &ToolSpec) -> String {
    format!(
        "- {}: {}\n  parameters: {}",
        spec.name,
        spec.description,
        spec.json_schema()
    )
}

pub fn render_catalog(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return "(no tools available)".to_string();
    }

    catalog
        .specs()
        .map(render_tool)
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt with the tool listing, followed by the user's text verbatim.
pub fn build_messages(catalog: &Catalog, user_text: &str) -> Vec<Message> {
    let system = format!(
        "{SYSTEM_INSTRUCTIONS}\n\nAvailable tools:\n{}",
        render_catalog(catalog)
    );

    vec![Message::system(system), Message::user(user_text)]
}

#[cfg(test)]
mod tests {
    use ttooling::math::{add_spec, divide_spec};

    use super::*;

    #[test]
    fn catalog_rendering_keeps_declaration_order_and_schema() {
        let catalog = Catalog::from_specs(vec![divide_spec(), add_spec()]);
        let rendered = render_catalog(&catalog);

        let divide = rendered.find("- divide:").expect("divide listed");
        let add = rendered.find("- add:").expect("add listed");
        assert!(divide < add);
        assert!(rendered.contains("\"required\":[\"a\",\"b\"]"));
    }

    #[test]
    fn empty_catalog_still_produces_a_prompt() {
        let messages = build_messages(&Catalog::new(), "hello");
        assert!(messages[0].content.contains("(no tools available)"));
        assert!(messages[0].content.contains("\"tool_name\": null"));
    }
}
