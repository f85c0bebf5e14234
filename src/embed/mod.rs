//! Embedded static resources for the playground.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Playground page served at `/`

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};
    use crate::editor::{PLACEHOLDER_TEXT, SAMPLE_INPUT};

    /// Variables for playground.html.
    pub struct PlaygroundVars {
        pub title: &'static str,
        pub version: &'static str,
        pub watchdog_ms: u64,
        /// Keep polling a timed-out attempt for its late result.
        pub late_results: bool,
        pub export_filename: String,
    }

    impl TemplateVars for PlaygroundVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__TITLE__", self.title)
                .replace("__VERSION__", self.version)
                .replace("__WATCHDOG_MS__", &self.watchdog_ms.to_string())
                .replace("__LATE_RESULTS__", if self.late_results { "true" } else { "false" })
                .replace("__EXPORT_FILENAME__", &js_string(&self.export_filename))
                .replace("__SAMPLE_INPUT__", &js_string(SAMPLE_INPUT))
                .replace("__PLACEHOLDER__", &js_string(PLACEHOLDER_TEXT))
        }
    }

    /// JSON string literal, safe inside a `<script>` block.
    fn js_string(s: &str) -> String {
        serde_json::to_string(s)
            .unwrap_or_else(|_| "\"\"".into())
            .replace("</", "<\\/")
    }

    /// Single-page playground: input, read-only output, Compile, Export.
    pub const PLAYGROUND_HTML: Template<PlaygroundVars> =
        Template::new(include_str!("serve/playground.html"));

}
