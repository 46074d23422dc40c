//! # Rich-text console wire format.
//!
//! Broadcasts to players go over the server's stdin as a single
//! `/tellraw @p [...]` line carrying an ordered JSON array of styled
//! segments. The consuming console protocol is picky: flags are the strings
//! `"true"`/`"false"` (not booleans), segment fields appear in declaration
//! order, and the segments of a multi-part notice are separated by plain
//! `" "` spacer strings. This encoding is reproduced bit-exact here.
//!
//! ## Example
//! ```
//! use modvisor::server::console::countdown_notice;
//!
//! assert_eq!(
//!     countdown_notice(64),
//!     r#"/tellraw @p [{"text":"Server updating in 64 seconds...","color":"yellow","bold":"false"}]"#
//! );
//! ```

use serde::Serialize;

/// A styled text segment of a console broadcast.
///
/// Field order matters: serde_json emits fields in declaration order, which
/// is the order the console protocol expects.
#[derive(Clone, Debug, Serialize)]
pub struct Segment {
    /// Text content.
    pub text: String,
    /// Color name, when styled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// `"true"`/`"false"`, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<String>,
    /// `"true"`/`"false"`, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlined: Option<String>,
    /// Click action attached to the segment.
    #[serde(rename = "clickEvent", skip_serializing_if = "Option::is_none")]
    pub click_event: Option<ClickEvent>,
}

/// A click action with a target URL.
#[derive(Clone, Debug, Serialize)]
pub struct ClickEvent {
    /// Action keyword, e.g. `open_url`.
    pub action: String,
    /// Action target.
    pub value: String,
}

impl Segment {
    /// Creates an unstyled segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: None,
            underlined: None,
            click_event: None,
        }
    }

    /// Sets the color.
    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Sets the bold flag (encoded as a string).
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold.to_string());
        self
    }

    /// Sets the underlined flag (encoded as a string).
    pub fn underlined(mut self, underlined: bool) -> Self {
        self.underlined = Some(underlined.to_string());
        self
    }

    /// Attaches an `open_url` click action.
    pub fn click_url(mut self, url: &str) -> Self {
        self.click_event = Some(ClickEvent {
            action: "open_url".to_string(),
            value: url.to_string(),
        });
        self
    }

    fn encode(&self) -> String {
        // Serialization of these plain string fields cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Composes the countdown notice broadcast during the graceful stop.
pub fn countdown_notice(seconds: u64) -> String {
    let segment = Segment::text(format!("Server updating in {seconds} seconds..."))
        .color("yellow")
        .bold(false);
    format!("/tellraw @p [{}]", segment.encode())
}

/// Composes the one-line update notice sent to online players.
///
/// Summarizes the counts of brand-new mods, changed mods, and removals, and
/// links back to the remote history. Parts are separated by `" "` spacer
/// strings on the wire.
pub fn update_notice(
    version: &str,
    new_mods: usize,
    changed_mods: usize,
    removed_mods: usize,
    history_url: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(
        Segment::text("[ UPDATE!! ]")
            .color("red")
            .bold(true)
            .encode(),
    );
    parts.push(
        Segment::text(format!(" Version {version}"))
            .color("yellow")
            .bold(false)
            .encode(),
    );

    if new_mods > 0 {
        parts.push(
            Segment::text(new_mods.to_string())
                .color("green")
                .bold(true)
                .encode(),
        );
    }
    if changed_mods > 0 {
        parts.push(
            Segment::text(changed_mods.to_string())
                .color("gray")
                .bold(true)
                .encode(),
        );
    }
    if removed_mods > 0 {
        parts.push(
            Segment::text(removed_mods.to_string())
                .color("red")
                .bold(true)
                .encode(),
        );
    }

    // The trailing link trio is one part: no spacers between its segments.
    parts.push(format!(
        "{},{},{}",
        Segment::text(" (").color("yellow").bold(false).encode(),
        Segment::text("View Online")
            .color("aqua")
            .underlined(true)
            .click_url(history_url)
            .encode(),
        Segment::text(")").color("yellow").underlined(false).encode(),
    ));

    format!("/tellraw @p [{}]", parts.join(r#"," ","#))
}
