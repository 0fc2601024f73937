use crate::events::StreamEvent;

/// Stateful encoder producing UI Message Stream events with a correct
/// text-block lifecycle.
///
/// Text blocks are opened lazily on the first delta and closed whenever a
/// tool call interleaves or the stream terminates, so `text-start` and
/// `text-end` are always properly paired.
///
/// # Text lifecycle rules
///
/// - delta with text closed → prepend `text-start`, open text
/// - tool input start with text open → prepend `text-end`, close text
/// - finish with text open → prepend `text-end` before `finish`
/// - error → terminal, no `text-end` needed
#[derive(Debug)]
pub struct StreamEncoder {
    message_id: String,
    text_open: bool,
    text_counter: u32,
    finished: bool,
}

impl StreamEncoder {
    /// Create an encoder for one assistant message.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            text_open: false,
            text_counter: 0,
            finished: false,
        }
    }

    /// The message id this encoder streams under.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Current text block id (`txt_0`, `txt_1`, ...).
    fn text_id(&self) -> String {
        format!("txt_{}", self.text_counter)
    }

    fn close_text(&mut self) -> StreamEvent {
        let event = StreamEvent::text_end(self.text_id());
        self.text_open = false;
        self.text_counter += 1;
        event
    }

    /// Stream prologue: the `start` event. Text blocks open lazily on the
    /// first delta, not here.
    pub fn prologue(&self) -> Vec<StreamEvent> {
        vec![StreamEvent::start(&self.message_id)]
    }

    /// Encode a text delta, opening a text block if none is open.
    pub fn text_delta(&mut self, delta: &str) -> Vec<StreamEvent> {
        if self.finished || delta.is_empty() {
            return Vec::new();
        }
        let mut events = Vec::new();
        if !self.text_open {
            self.text_open = true;
            events.push(StreamEvent::text_start(self.text_id()));
        }
        events.push(StreamEvent::text_delta(self.text_id(), delta));
        events
    }

    /// Encode a tool call start, closing any open text block first.
    pub fn tool_input_start(&mut self, id: &str, name: &str) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.text_open {
            events.push(self.close_text());
        }
        events.push(StreamEvent::tool_input_start(id, name));
        events
    }

    /// Encode an incremental tool input chunk.
    pub fn tool_input_delta(&mut self, id: &str, delta: &str) -> Vec<StreamEvent> {
        if self.finished || delta.is_empty() {
            return Vec::new();
        }
        vec![StreamEvent::tool_input_delta(id, delta)]
    }

    /// Encode a completed tool input.
    pub fn tool_input_available(
        &mut self,
        id: &str,
        name: &str,
        input: serde_json::Value,
    ) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        vec![StreamEvent::tool_input_available(id, name, input)]
    }

    /// Encode a tool execution result.
    pub fn tool_output_available(&mut self, id: &str, output: serde_json::Value) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        vec![StreamEvent::tool_output_available(id, output)]
    }

    /// Encode a tool execution failure.
    pub fn tool_output_error(&mut self, id: &str, error_text: &str) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        vec![StreamEvent::tool_output_error(id, error_text)]
    }

    /// Encode a step boundary (closing any open text block).
    pub fn finish_step(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.text_open {
            events.push(self.close_text());
        }
        events.push(StreamEvent::finish_step());
        events
    }

    /// Encode a step start.
    pub fn start_step(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        vec![StreamEvent::start_step()]
    }

    /// Terminate the stream gracefully.
    pub fn finish(&mut self, reason: &str) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        let mut events = Vec::new();
        if self.text_open {
            events.push(self.close_text());
        }
        events.push(StreamEvent::finish_with_reason(reason));
        events
    }

    /// Terminate the stream with an error. Output already emitted stays valid.
    pub fn error(&mut self, message: &str) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        self.text_open = false;
        vec![StreamEvent::error(message)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(events: &[StreamEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                StreamEvent::Start { .. } => "start",
                StreamEvent::TextStart { .. } => "text-start",
                StreamEvent::TextDelta { .. } => "text-delta",
                StreamEvent::TextEnd { .. } => "text-end",
                StreamEvent::ToolInputStart { .. } => "tool-input-start",
                StreamEvent::ToolInputDelta { .. } => "tool-input-delta",
                StreamEvent::ToolInputAvailable { .. } => "tool-input-available",
                StreamEvent::ToolOutputAvailable { .. } => "tool-output-available",
                StreamEvent::ToolOutputError { .. } => "tool-output-error",
                StreamEvent::StartStep => "start-step",
                StreamEvent::FinishStep => "finish-step",
                StreamEvent::Finish { .. } => "finish",
                StreamEvent::Error { .. } => "error",
            })
            .collect()
    }

    #[test]
    fn first_delta_opens_text_block() {
        let mut enc = StreamEncoder::new("msg_1");
        let events = enc.text_delta("Hello");
        assert_eq!(types(&events), vec!["text-start", "text-delta"]);
        let events = enc.text_delta(" world");
        assert_eq!(types(&events), vec!["text-delta"]);
    }

    #[test]
    fn tool_start_closes_open_text() {
        let mut enc = StreamEncoder::new("msg_1");
        enc.text_delta("thinking");
        let events = enc.tool_input_start("c1", "weather");
        assert_eq!(types(&events), vec!["text-end", "tool-input-start"]);
    }

    #[test]
    fn text_after_tool_gets_fresh_block_id() {
        let mut enc = StreamEncoder::new("msg_1");
        enc.text_delta("a");
        enc.tool_input_start("c1", "weather");
        let events = enc.text_delta("b");
        match &events[0] {
            StreamEvent::TextStart { id } => assert_eq!(id, "txt_1"),
            other => panic!("expected text-start, got {other:?}"),
        }
    }

    #[test]
    fn finish_closes_open_text() {
        let mut enc = StreamEncoder::new("msg_1");
        enc.text_delta("partial");
        let events = enc.finish("stop");
        assert_eq!(types(&events), vec!["text-end", "finish"]);
    }

    #[test]
    fn finish_without_text_is_bare() {
        let mut enc = StreamEncoder::new("msg_1");
        assert_eq!(types(&enc.finish("stop")), vec!["finish"]);
    }

    #[test]
    fn nothing_after_terminal() {
        let mut enc = StreamEncoder::new("msg_1");
        enc.error("boom");
        assert!(enc.text_delta("late").is_empty());
        assert!(enc.finish("stop").is_empty());
        assert!(enc.tool_input_start("c", "t").is_empty());
    }

    #[test]
    fn empty_delta_is_dropped() {
        let mut enc = StreamEncoder::new("msg_1");
        assert!(enc.text_delta("").is_empty());
    }

    #[test]
    fn step_boundaries_pair_text() {
        let mut enc = StreamEncoder::new("msg_1");
        enc.text_delta("step one");
        let events = enc.finish_step();
        assert_eq!(types(&events), vec!["text-end", "finish-step"]);
        assert_eq!(types(&enc.start_step()), vec!["start-step"]);
    }
}
