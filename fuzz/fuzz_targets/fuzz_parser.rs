#![no_main]

use arbitrary::Arbitrary;
use janus_json::{Handler, ParseConfig, Parser, ReverseParser, Status};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    config: ParseConfig,
    split: usize,
    data: Vec<u8>,
}

#[derive(Debug, Default, PartialEq)]
struct Events(Vec<Vec<u8>>);

impl Events {
    fn tag(&mut self, name: &str, payload: &[u8]) -> bool {
        let mut event = name.as_bytes().to_vec();
        event.push(b':');
        event.extend_from_slice(payload);
        self.0.push(event);
        true
    }
}

impl Handler for Events {
    fn null(&mut self) -> bool {
        self.tag("null", b"")
    }
    fn boolean(&mut self, value: bool) -> bool {
        self.tag("bool", &[value as u8])
    }
    fn integer(&mut self, value: i64) -> bool {
        self.tag("int", value.to_string().as_bytes())
    }
    fn double(&mut self, value: f64) -> bool {
        self.tag("dbl", value.to_bits().to_string().as_bytes())
    }
    fn string(&mut self, bytes: &[u8]) -> bool {
        self.tag("str", bytes)
    }
    fn start_map(&mut self) -> bool {
        self.tag("{", b"")
    }
    fn map_key(&mut self, key: &[u8]) -> bool {
        self.tag("key", key)
    }
    fn end_map(&mut self) -> bool {
        self.tag("}", b"")
    }
    fn start_array(&mut self) -> bool {
        self.tag("[", b"")
    }
    fn end_array(&mut self) -> bool {
        self.tag("]", b"")
    }
}

fn run_forward(config: ParseConfig, chunks: &[&[u8]]) -> (Events, Status) {
    let mut parser = Parser::new(config);
    let mut events = Events::default();
    for chunk in chunks {
        let status = parser.parse(&mut events, chunk);
        if status != Status::Ok {
            return (events, status);
        }
    }
    (events, parser.finish(&mut events))
}

// Chunking independence under every flag combination: splitting the input
// must never change the outcome or the event stream. The reverse parser
// only needs to not panic (its event order is its own).
fuzz_target!(|input: Input| {
    let data = &input.data[..];
    let split = if data.is_empty() {
        0
    } else {
        input.split % (data.len() + 1)
    };

    let (whole_events, whole_status) = run_forward(input.config, &[data]);
    let (split_events, split_status) =
        run_forward(input.config, &[&data[..split], &data[split..]]);

    assert_eq!(whole_status, split_status);
    assert_eq!(whole_events, split_events);

    let mut parser = ReverseParser::new(input.config);
    let mut events = Events::default();
    let status = parser.parse(&mut events, data);
    if status == Status::Ok {
        let _ = parser.finish(&mut events);
    }
});
