//! Viewer-request handler.

use crate::edge::event::{EdgeEvent, EdgeOutput};
use crate::redirect::{Action, RedirectTable};

/// Run the redirect decision for one event.
pub fn handle_event(table: &RedirectTable, event: EdgeEvent) -> EdgeOutput {
    match table.decide(&event.request.uri) {
        Action::Passthrough => EdgeOutput::Request(event.request),
        Action::Redirect(redirect) => EdgeOutput::Response(redirect.into()),
    }
}

/// Parse an event from JSON, handle it and serialize the output.
pub fn handle_json(table: &RedirectTable, input: &str) -> Result<String, serde_json::Error> {
    let event: EdgeEvent = serde_json::from_str(input)?;
    serde_json::to_string(&handle_event(table, event))
}
