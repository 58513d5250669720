use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;
use std::thread;

use h1pipe::http::{Finish, HeadersEvent, Request, ResponseHandler, ResponseParser};
use h1pipe::error::Error;
use h1pipe::pipe::Pipe;
use h1pipe::platform::Platform;

use log::debug;

const HOST: &str = "www.example.com";

#[derive(Default)]
struct Collect {
    status: Vec<u16>,
    body: Vec<u8>,
    finished: Vec<Finish>,
}

impl ResponseHandler for Collect {
    fn on_headers(&mut self, event: &HeadersEvent) {
        debug!("client: headers {:?}", event.headers);
        self.status.push(event.status_code);
    }

    fn on_data(&mut self, data: &[u8]) { self.body.extend_from_slice(data); }

    fn on_error(&mut self, error: Error) { panic!("client: {}", error) }

    fn on_finished(&mut self, finish: Finish) { self.finished.push(finish); }
}

/// Read one request head, return its method and path.
fn read_request(tcp: &mut TcpStream, buf: &mut Vec<u8>) -> (String, String) {
    let mut tmp = [0u8; 512];
    loop {
        let mut headers = [httparse::EMPTY_HEADER; 16];
        let mut request = httparse::Request::new(&mut headers);
        if let httparse::Status::Complete(n) = request.parse(buf).unwrap() {
            let method = request.method.unwrap().to_owned();
            let path = request.path.unwrap().to_owned();
            assert!(request
                .headers
                .iter()
                .any(|h| h.name == "Host" && h.value == HOST.as_bytes()));
            buf.drain(..n);
            return (method, path);
        }

        let n = tcp.read(&mut tmp).unwrap();
        assert_ne!(n, 0);
        buf.extend_from_slice(&tmp[..n]);
    }
}

#[test]
fn tcp_response() {
    let _ = env_logger::try_init();

    let lis = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = lis.local_addr().unwrap();

    let t1 = thread::spawn(move || {
        let (mut tcp, _) = lis.accept().unwrap();
        let mut buf = Vec::new();
        debug!("server: tcp accepted!");

        // chunked, trickled
        let (method, path) = read_request(&mut tcp, &mut buf);
        assert_eq!((method.as_str(), path.as_str()), ("GET", "/chunked?page=1"));
        for piece in [
            &b"HTTP/1.1 200 OK\r\nTransfer-"[..],
            b"Encoding: chunked\r\n\r\n5\r\nHel",
            b"lo\r\n8\r\n, world!\r",
            b"\n0\r\n\r\n",
        ] {
            tcp.write_all(piece).unwrap();
            thread::sleep(Duration::from_millis(20));
        }
        debug!("server: chunked response sent");

        // same connection, framed by length
        let (method, path) = read_request(&mut tcp, &mut buf);
        assert_eq!((method.as_str(), path.as_str()), ("GET", "/length"));
        tcp.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\n\r\nHello, ").unwrap();
        thread::sleep(Duration::from_millis(20));
        tcp.write_all(b"world!").unwrap();
        debug!("server: length response sent");

        // unframed, ends with the connection
        let (method, path) = read_request(&mut tcp, &mut buf);
        assert_eq!((method.as_str(), path.as_str()), ("GET", "/close"));
        tcp.write_all(b"HTTP/1.0 200 OK\r\nConnection: close\r\n\r\n").unwrap();
        thread::sleep(Duration::from_millis(20));
        tcp.write_all(b"good").unwrap();
        thread::sleep(Duration::from_millis(20));
        tcp.write_all(b"bye").unwrap();
        debug!("server: close");
    });

    let t2 = thread::spawn(move || {
        let tcp = TcpStream::connect(addr).unwrap();
        debug!("client: tcp connected!");
        let mut pipe = Pipe::new(tcp);
        let platform = Platform::new();

        let request = Request::get(HOST, "/chunked").with_query("page=1");
        let mut parser = ResponseParser::send(&mut pipe, &request, &platform).unwrap();
        let mut collect = Collect::default();
        pipe.notify_data();
        parser.drive(&mut pipe, &mut collect);

        assert_eq!(collect.status, vec![200]);
        assert_eq!(collect.body, b"Hello, world!");
        assert_eq!(collect.finished, vec![Finish::Chunked]);
        assert_eq!(pipe.stashed(), 0);

        let request = Request::get(HOST, "/length");
        let mut parser = ResponseParser::send(&mut pipe, &request, &platform).unwrap();
        let mut collect = Collect::default();
        pipe.notify_data();
        parser.drive(&mut pipe, &mut collect);

        assert_eq!(collect.body, b"Hello, world!");
        assert_eq!(collect.finished, vec![Finish::Length]);

        let request = Request::get(HOST, "/close");
        let mut parser = ResponseParser::send(&mut pipe, &request, &platform).unwrap();
        let mut collect = Collect::default();
        pipe.notify_data();
        parser.drive(&mut pipe, &mut collect);

        // no framing, the body runs until close
        assert_eq!(collect.finished, vec![Finish::Closed]);
        assert!(pipe.is_closed());
        assert!(pipe.forbid_reuse);

        // anything read along with the head was stashed
        let mut buf = [0u8; 64];
        let mut stashed = Vec::new();
        while let Some(n) = pipe.unstash(&mut buf) {
            stashed.extend_from_slice(&buf[..n]);
        }
        stashed.extend_from_slice(&collect.body);
        assert_eq!(stashed, b"goodbye");
        debug!("client: done, {} bytes read", pipe.bytes_read());
    });

    t1.join().unwrap();
    t2.join().unwrap();
}
