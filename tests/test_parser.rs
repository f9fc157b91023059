use hearth::ParseError;
use hearth::http::parser::Parser;
use hearth::http::request::{Method, Request, RequestAssembler, Version};
use hearth::HeaderValue;

fn parse(input: &[u8]) -> Result<(Request, usize), ParseError> {
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();
    let consumed = parser.advance(input, &mut asm)?;
    assert!(parser.is_complete(), "request should be complete");
    Ok((asm.take().expect("complete request"), consumed))
}

fn parse_byte_by_byte(input: &[u8]) -> Result<Request, ParseError> {
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();
    let mut buf: Vec<u8> = Vec::new();
    for &b in input {
        buf.push(b);
        let consumed = parser.advance(&buf, &mut asm)?;
        buf.drain(..consumed);
    }
    assert!(parser.is_complete(), "request should be complete");
    Ok(asm.take().expect("complete request"))
}

#[test]
fn test_parse_simple_get_request() {
    let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse(raw).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.uri, "/");
    assert_eq!(parsed.version, Version::Http11);
    assert_eq!(parsed.headers.get("Host"), Some("example.com"));
    assert!(parsed.body.is_empty());
    assert_eq!(consumed, raw.len());
}

#[test]
fn test_parse_post_request_with_body() {
    let raw = b"POST /a HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse(raw).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.uri, "/a");
    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, raw.len());
}

#[test]
fn test_request_target_is_kept_raw() {
    let raw = b"GET /search%20x?q=rust&b=%2F HTTP/1.1\r\nHost: e\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    // No percent-decoding, no normalization.
    assert_eq!(parsed.uri, "/search%20x?q=rust&b=%2F");
}

#[test]
fn test_parse_multiple_headers() {
    let raw = b"GET /p HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    assert_eq!(parsed.headers.get("Host"), Some("example.com"));
    assert_eq!(parsed.headers.get("User-Agent"), Some("test-client"));
    assert_eq!(parsed.headers.get("Accept"), Some("*/*"));
}

#[test]
fn test_repeated_header_yields_ordered_sequence() {
    let raw = b"GET / HTTP/1.1\r\nHost: x\r\nX-A: 1\r\nX-A: 2\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    assert_eq!(
        parsed.headers.get_all("X-A"),
        Some(&HeaderValue::Multi(vec!["1".into(), "2".into()]))
    );
}

#[test]
fn test_single_header_stays_single() {
    let raw = b"GET / HTTP/1.1\r\nHost: x\r\nX-A: 1\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    assert_eq!(
        parsed.headers.get_all("X-A"),
        Some(&HeaderValue::Single("1".into()))
    );
}

#[test]
fn test_incomplete_request_is_not_complete() {
    let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    parser.advance(raw, &mut asm).unwrap();
    assert!(!parser.is_complete());
}

#[test]
fn test_incomplete_body_is_not_complete() {
    let raw = b"POST /a HTTP/1.1\r\nHost: x\r\nContent-Length: 10\r\n\r\nhello";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    let consumed = parser.advance(raw, &mut asm).unwrap();
    assert_eq!(consumed, raw.len());
    assert!(!parser.is_complete());
}

#[test]
fn test_invalid_method_is_rejected() {
    let raw = b"INVALID / HTTP/1.1\r\nHost: x\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    assert_eq!(
        parser.advance(raw, &mut asm),
        Err(ParseError::InvalidMethod)
    );
}

#[test]
fn test_lowercase_method_is_rejected() {
    let raw = b"get / HTTP/1.1\r\nHost: x\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    assert_eq!(
        parser.advance(raw, &mut asm),
        Err(ParseError::InvalidMethod)
    );
}

#[test]
fn test_malformed_header_is_rejected() {
    let raw = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    assert_eq!(
        parser.advance(raw, &mut asm),
        Err(ParseError::InvalidHeader)
    );
}

#[test]
fn test_unsupported_version_is_rejected() {
    for raw in [
        b"GET / HTTP/2.0\r\nHost: x\r\n\r\n".as_slice(),
        b"GET / HTTP/0.9\r\nHost: x\r\n\r\n".as_slice(),
    ] {
        let mut parser = Parser::new();
        let mut asm = RequestAssembler::new();
        assert_eq!(
            parser.advance(raw, &mut asm),
            Err(ParseError::UnsupportedVersion)
        );
    }
}

#[test]
fn test_garbage_version_is_a_bad_request_line() {
    let raw = b"GET / FTP/1.1\r\nHost: x\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    assert_eq!(
        parser.advance(raw, &mut asm),
        Err(ParseError::InvalidRequestLine)
    );
}

#[test]
fn test_missing_host_in_http11_is_rejected() {
    let raw = b"GET / HTTP/1.1\r\nX-A: 1\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    assert_eq!(parser.advance(raw, &mut asm), Err(ParseError::MissingHost));
}

#[test]
fn test_host_not_required_in_http10() {
    let raw = b"GET / HTTP/1.0\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    assert_eq!(parsed.version, Version::Http10);
    assert!(!parsed.keep_alive());
}

#[test]
fn test_invalid_content_length_is_rejected() {
    let raw = b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: nope\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    assert_eq!(
        parser.advance(raw, &mut asm),
        Err(ParseError::InvalidContentLength)
    );
}

#[test]
fn test_conflicting_content_lengths_are_rejected() {
    let raw = b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\nContent-Length: 6\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    assert_eq!(
        parser.advance(raw, &mut asm),
        Err(ParseError::InvalidContentLength)
    );
}

#[test]
fn test_chunked_body_is_decoded() {
    let raw = b"POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
    let (parsed, consumed) = parse(raw).unwrap();

    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, raw.len());
}

#[test]
fn test_chunked_overrides_content_length() {
    let raw = b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 3\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    assert_eq!(parsed.body, b"hello".to_vec());
}

#[test]
fn test_chunk_extensions_are_ignored() {
    let raw =
        b"POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n5;ext=1\r\nhello\r\n0\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    assert_eq!(parsed.body, b"hello".to_vec());
}

#[test]
fn test_bad_chunk_size_is_rejected() {
    let raw = b"POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    assert_eq!(parser.advance(raw, &mut asm), Err(ParseError::InvalidChunk));
}

#[test]
fn test_expect_continue_is_recorded() {
    let raw = b"POST / HTTP/1.1\r\nHost: x\r\nExpect: 100-continue\r\nContent-Length: 5\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    parser.advance(raw, &mut asm).unwrap();
    assert!(parser.headers_complete());
    assert!(parser.expects_continue());
    assert!(!parser.is_complete());
}

#[test]
fn test_byte_by_byte_equals_one_shot() {
    let raw = b"POST /a?b=c HTTP/1.1\r\nHost: x\r\nX-A: 1\r\nX-A: 2\r\nContent-Length: 5\r\n\r\nhello";
    let (one_shot, _) = parse(raw).unwrap();
    let dribbled = parse_byte_by_byte(raw).unwrap();

    assert_eq!(one_shot, dribbled);
}

#[test]
fn test_chunked_byte_by_byte_equals_one_shot() {
    let raw =
        b"POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n2\r\nde\r\n0\r\n\r\n";
    let (one_shot, _) = parse(raw).unwrap();
    let dribbled = parse_byte_by_byte(raw).unwrap();

    assert_eq!(one_shot, dribbled);
    assert_eq!(one_shot.body, b"abcde".to_vec());
}

#[test]
fn test_pipelined_requests_parse_in_order() {
    let raw = b"GET /one HTTP/1.1\r\nHost: x\r\n\r\nGET /two HTTP/1.1\r\nHost: x\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();

    let consumed = parser.advance(raw, &mut asm).unwrap();
    assert!(parser.is_complete());
    let first = asm.take().unwrap();
    assert_eq!(first.uri, "/one");
    assert!(consumed < raw.len());

    parser.reset();
    asm.reset();
    let consumed_second = parser.advance(&raw[consumed..], &mut asm).unwrap();
    assert!(parser.is_complete());
    assert_eq!(consumed + consumed_second, raw.len());
    assert_eq!(asm.take().unwrap().uri, "/two");
}

#[test]
fn test_keep_alive_defaults() {
    let (http11, _) = parse(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
    assert!(http11.keep_alive());

    let (http11_close, _) = parse(b"GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").unwrap();
    assert!(!http11_close.keep_alive());

    let (http10, _) = parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();
    assert!(!http10.keep_alive());

    let (http10_keep, _) = parse(b"GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n").unwrap();
    assert!(http10_keep.keep_alive());
}

#[test]
fn test_chunked_is_found_in_encoding_list() {
    let raw = b"POST /up HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: gzip, chunked\r\n\r\n\
                3\r\nabc\r\n0\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    assert_eq!(parsed.body, b"abc".to_vec());

    let raw = b"POST /up HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: Chunked\r\n\r\n\
                3\r\nabc\r\n0\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();
    assert_eq!(parsed.body, b"abc".to_vec());
}

#[test]
fn test_signed_content_length_is_rejected() {
    let raw = b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: +5\r\n\r\nhello";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();
    assert_eq!(
        parser.advance(raw, &mut asm),
        Err(ParseError::InvalidContentLength)
    );
}

#[test]
fn test_signed_chunk_size_is_rejected() {
    let raw = b"POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n+3\r\nabc\r\n0\r\n\r\n";
    let mut parser = Parser::new();
    let mut asm = RequestAssembler::new();
    assert_eq!(parser.advance(raw, &mut asm), Err(ParseError::InvalidChunk));
}

#[test]
fn test_non_utf8_target_bytes_are_replaced() {
    let raw = b"GET /a\xffb HTTP/1.1\r\nHost: x\r\n\r\n";
    let (parsed, _) = parse(raw).unwrap();

    assert_eq!(parsed.uri, "/a\u{fffd}b");
}
