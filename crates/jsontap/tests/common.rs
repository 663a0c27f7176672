#![allow(missing_docs, dead_code)]

use jsontap::{
    Container, DecodeJsonCallbacks, DecodeJsonResult, Input, IoBuffer, MemoryInput, decode_json,
};

/// One callback invocation, recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Push(Container),
    Pop(Container),
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// Records every event; optionally vetoes after the nth one.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub fail_after: Option<(usize, &'static str)>,
    pub done_calls: usize,
    pub done_result: Option<DecodeJsonResult>,
}

impl Recorder {
    fn record(&mut self, event: Event) -> Result<(), String> {
        self.events.push(event);
        match self.fail_after {
            Some((n, message)) if self.events.len() >= n => Err(message.to_string()),
            _ => Ok(()),
        }
    }
}

impl DecodeJsonCallbacks for Recorder {
    fn push(&mut self, container: Container) -> Result<(), String> {
        self.record(Event::Push(container))
    }
    fn pop(&mut self, container: Container) -> Result<(), String> {
        self.record(Event::Pop(container))
    }
    fn append_null(&mut self) -> Result<(), String> {
        self.record(Event::Null)
    }
    fn append_bool(&mut self, value: bool) -> Result<(), String> {
        self.record(Event::Bool(value))
    }
    fn append_i64(&mut self, value: i64) -> Result<(), String> {
        self.record(Event::I64(value))
    }
    fn append_f64(&mut self, value: f64) -> Result<(), String> {
        self.record(Event::F64(value))
    }
    fn append_text_string(&mut self, value: String) -> Result<(), String> {
        self.record(Event::Text(value))
    }
    fn append_byte_string(&mut self, value: Vec<u8>) -> Result<(), String> {
        self.record(Event::Bytes(value))
    }
    fn done(&mut self, result: &DecodeJsonResult, _input: &mut dyn Input, _buffer: &mut IoBuffer) {
        self.done_calls += 1;
        self.done_result = Some(result.clone());
    }
}

/// Serves `chunk`-sized pulls; optionally brings its own small window, which
/// forces the driver through its compact-and-refill path.
pub struct ChunkedInput {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    window: Option<usize>,
}

impl ChunkedInput {
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk,
            window: None,
        }
    }

    pub fn with_window(mut self, len: usize) -> Self {
        self.window = Some(len);
        self
    }
}

impl Input for ChunkedInput {
    fn bring_your_own_buffer(&mut self) -> Option<IoBuffer> {
        self.window.map(IoBuffer::with_capacity)
    }

    fn copy_in(&mut self, dst: &mut IoBuffer) -> Result<(), String> {
        let remaining = self.data.len() - self.pos;
        if remaining == 0 {
            dst.closed = true;
            return Ok(());
        }
        let room = dst.data.len() - dst.wi;
        let n = remaining.min(self.chunk).min(room);
        dst.writable()[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        dst.commit(n);
        self.pos += n;
        if self.pos == self.data.len() {
            dst.closed = true;
        }
        Ok(())
    }
}

/// Delivers a prefix on the first pull, then fails every later one.
pub struct FailingInput {
    prefix: Vec<u8>,
    delivered: bool,
    message: &'static str,
}

impl FailingInput {
    pub fn new(prefix: impl Into<Vec<u8>>, message: &'static str) -> Self {
        Self {
            prefix: prefix.into(),
            delivered: false,
            message,
        }
    }
}

impl Input for FailingInput {
    fn copy_in(&mut self, dst: &mut IoBuffer) -> Result<(), String> {
        if self.delivered {
            return Err(self.message.to_string());
        }
        self.delivered = true;
        let n = self.prefix.len().min(dst.data.len() - dst.wi);
        dst.writable()[..n].copy_from_slice(&self.prefix[..n]);
        dst.commit(n);
        Ok(())
    }
}

pub fn decode_memory(json: &str, quirks: &[u32], pointer: &str) -> (Recorder, DecodeJsonResult) {
    let mut recorder = Recorder::default();
    let mut input = MemoryInput::new(json);
    let result = decode_json(&mut recorder, &mut input, quirks, pointer);
    (recorder, result)
}

pub fn decode_chunked(
    json: &str,
    chunk: usize,
    window: usize,
    quirks: &[u32],
    pointer: &str,
) -> (Recorder, DecodeJsonResult) {
    let mut recorder = Recorder::default();
    let mut input = ChunkedInput::new(json.as_bytes().to_vec(), chunk).with_window(window);
    let result = decode_json(&mut recorder, &mut input, quirks, pointer);
    (recorder, result)
}

/// Rebuilds the document a recorded event stream describes, for comparison
/// against `serde_json`'s reading of the same text. Returns `None` for
/// unbalanced or otherwise malformed streams.
pub fn reconstruct(events: &[Event]) -> Option<serde_json::Value> {
    use serde_json::{Map, Value};

    enum Frame {
        Object {
            map: Map<String, Value>,
            key: Option<String>,
        },
        Array(Vec<Value>),
    }

    fn place(stack: &mut Vec<Frame>, root: &mut Option<Value>, value: Value) -> Option<()> {
        match stack.last_mut() {
            None => {
                if root.is_some() {
                    return None;
                }
                *root = Some(value);
            }
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Object { map, key }) => {
                map.insert(key.take()?, value);
            }
        }
        Some(())
    }

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;
    for event in events {
        match event {
            Event::Push(Container::Object) => stack.push(Frame::Object {
                map: Map::new(),
                key: None,
            }),
            Event::Push(Container::Array) => stack.push(Frame::Array(Vec::new())),
            Event::Pop(_) => {
                let value = match stack.pop()? {
                    Frame::Object { map, key } => {
                        if key.is_some() {
                            return None;
                        }
                        Value::Object(map)
                    }
                    Frame::Array(items) => Value::Array(items),
                };
                place(&mut stack, &mut root, value)?;
            }
            Event::Text(s) => {
                // Inside an object, a string with no key pending is the key.
                let takes_key =
                    matches!(stack.last(), Some(Frame::Object { key: None, .. }));
                if takes_key {
                    if let Some(Frame::Object { key, .. }) = stack.last_mut() {
                        *key = Some(s.clone());
                    }
                } else {
                    place(&mut stack, &mut root, Value::String(s.clone()))?;
                }
            }
            Event::Null => place(&mut stack, &mut root, Value::Null)?,
            Event::Bool(b) => place(&mut stack, &mut root, Value::Bool(*b))?,
            Event::I64(i) => place(&mut stack, &mut root, Value::from(*i))?,
            Event::F64(f) => place(
                &mut stack,
                &mut root,
                Value::Number(serde_json::Number::from_f64(*f)?),
            )?,
            Event::Bytes(_) => return None,
        }
    }
    if !stack.is_empty() {
        return None;
    }
    root
}

#[test]
fn chunked_input_closes_its_window_at_end_of_data() {
    let mut input = ChunkedInput::new(&b"abc"[..], 2);
    let mut buf = IoBuffer::with_capacity(8);
    input.copy_in(&mut buf).unwrap();
    assert_eq!(buf.readable(), b"ab");
    assert!(!buf.closed);
    input.copy_in(&mut buf).unwrap();
    assert_eq!(buf.readable(), b"abc");
    assert!(buf.closed);
}
