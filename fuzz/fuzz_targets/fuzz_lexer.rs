#![no_main]

use janus_json::{Lexed, Lexer, ReverseLexer};
use libfuzzer_sys::fuzz_target;

// Both lexers must survive arbitrary bytes without panicking, and the
// forward lexer must produce the same tokens whether the input is one
// chunk or split at an arbitrary point.
fuzz_target!(|data: &[u8]| {
    let split = if data.is_empty() {
        0
    } else {
        data[0] as usize % (data.len() + 1)
    };

    let mut whole = Vec::new();
    let mut lexer = Lexer::new(true, true);
    let mut offset = 0;
    loop {
        match lexer.lex(data, &mut offset) {
            Ok(Lexed::Token { tok, raw }) => whole.push((tok, raw.to_vec())),
            Ok(Lexed::NeedMore) | Err(_) => break,
        }
    }
    let whole_err = lexer.last_error();

    let mut chunked = Vec::new();
    let mut lexer = Lexer::new(true, true);
    let mut failed = false;
    'chunks: for chunk in [&data[..split], &data[split..]] {
        let mut offset = 0;
        loop {
            match lexer.lex(chunk, &mut offset) {
                Ok(Lexed::Token { tok, raw }) => chunked.push((tok, raw.to_vec())),
                Ok(Lexed::NeedMore) => break,
                Err(_) => {
                    failed = true;
                    break 'chunks;
                }
            }
        }
    }

    if whole_err.is_none() && !failed {
        assert_eq!(whole, chunked);
    }

    let mut lexer = ReverseLexer::new(true, true);
    let mut offset = data.len();
    loop {
        match lexer.lex(data, &mut offset) {
            Ok(Lexed::Token { .. }) => continue,
            Ok(Lexed::NeedMore) | Err(_) => break,
        }
    }
});
