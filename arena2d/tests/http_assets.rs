use std::cell::RefCell;
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::rc::Rc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use arena2d::{
    AssetConfig, AssetError, AssetLoader, AudioBackend, AudioLine, DefaultImageDecoder, Result,
    Sound, Sprite,
};
use image::{ImageOutputFormat, Rgba, RgbaImage};

/// Serve a single HTTP request with the given status line and body.
/// Returns the base URL and the server thread.
fn serve_once(status: &'static str, body: Vec<u8>) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_request_head(&mut stream);
        let head = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        // The client may hang up early on error statuses.
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
        let _ = stream.flush();
    });
    (base, handle)
}

/// Accept one connection and never answer it.
fn serve_silence(hold: Duration) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_request_head(&mut stream);
        thread::sleep(hold);
    });
    (base, handle)
}

fn read_request_head(stream: &mut impl Read) {
    let mut request = Vec::new();
    let mut buf = [0u8; 512];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        request.extend_from_slice(&buf[..n]);
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut image = RgbaImage::new(width, height);
    image.put_pixel(0, 0, Rgba([1, 2, 3, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageOutputFormat::Png).unwrap();
    bytes.into_inner()
}

struct IdleLine;

impl AudioLine for IdleLine {
    fn start(&mut self, _looping: bool) -> Result<()> {
        Ok(())
    }
    fn stop(&mut self) {}
    fn rewind(&mut self) {}
    fn is_running(&self) -> bool {
        false
    }
    fn set_gain_db(&mut self, _db: f32) {}
    fn close(&mut self) {}
}

#[derive(Default)]
struct CapturingBackend {
    received: Rc<RefCell<Option<(String, Vec<u8>)>>>,
}

impl AudioBackend for CapturingBackend {
    fn open_line(&self, name: &str, bytes: Vec<u8>) -> Result<Box<dyn AudioLine>> {
        *self.received.borrow_mut() = Some((name.to_string(), bytes));
        Ok(Box::new(IdleLine))
    }
}

#[test]
fn sprite_loads_from_url() {
    let (base, server) = serve_once("200 OK", png_bytes(3, 2));
    let url = format!("{}/img.png", base);

    let sprite = Sprite::new(url.as_str(), 0.0, 0.0, 30.0, 20.0);
    server.join().unwrap();

    assert!(sprite.load_error().is_none(), "{:?}", sprite.load_error());
    assert_eq!(sprite.source(), url);
    assert_eq!(sprite.image_dimensions(), Some((3, 2)));
    assert_eq!(sprite.image().unwrap().get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
}

#[test]
fn sub_second_timeout_still_fetches() {
    let (base, server) = serve_once("200 OK", png_bytes(1, 1));
    let loader = AssetLoader::new(AssetConfig::new().with_http_timeout(Duration::from_millis(500)));

    let sprite = Sprite::with_loader(
        format!("{}/tiny.png", base),
        0.0,
        0.0,
        1.0,
        1.0,
        &loader,
        &DefaultImageDecoder,
    );
    server.join().unwrap();

    assert!(sprite.load_error().is_none(), "{:?}", sprite.load_error());
    assert_eq!(sprite.image_dimensions(), Some((1, 1)));
}

#[test]
fn stalled_server_times_out() {
    let (base, server) = serve_silence(Duration::from_secs(2));
    let loader = AssetLoader::new(AssetConfig::new().with_http_timeout(Duration::from_millis(200)));

    let err = loader.load_bytes(&format!("{}/slow.png", base)).unwrap_err();
    assert!(matches!(err, AssetError::ResourceLoad { .. }), "{:?}", err);
    server.join().unwrap();
}

#[test]
fn not_found_is_a_load_error() {
    let (base, server) = serve_once("404 Not Found", b"missing".to_vec());
    let url = format!("{}/gone.png", base);

    let mut sprite = Sprite::from_image(RgbaImage::new(1, 1), 0.0, 0.0, 1.0, 1.0);
    let err = sprite.try_set_source(url.as_str()).unwrap_err();
    server.join().unwrap();

    match err {
        AssetError::ResourceLoad { asset, .. } => assert_eq!(asset, url),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(sprite.source(), url);
    assert!(sprite.image().is_none());
}

#[test]
fn sound_bytes_come_from_url() {
    let clip = b"RIFF....WAVEfmt fake clip".to_vec();
    let (base, server) = serve_once("200 OK", clip.clone());
    let url = format!("{}/sfx/boom.wav", base);
    let backend = CapturingBackend::default();

    let sound = Sound::with_backend(url.as_str(), true, 0.5, &AssetLoader::default(), &backend);
    server.join().unwrap();

    assert!(sound.load_error().is_none());
    assert_eq!(sound.source(), url);
    assert_eq!(*backend.received.borrow(), Some((url.clone(), clip)));
}

#[test]
fn sound_from_failing_url_is_unusable() {
    let (base, server) = serve_once("500 Internal Server Error", Vec::new());
    let backend = CapturingBackend::default();

    let mut sound = Sound::with_backend(
        format!("{}/sfx/boom.wav", base),
        false,
        1.0,
        &AssetLoader::default(),
        &backend,
    );
    server.join().unwrap();

    assert!(matches!(sound.load_error(), Some(AssetError::ResourceLoad { .. })));
    assert!(backend.received.borrow().is_none());
    assert!(matches!(sound.play(), Err(AssetError::InvalidState(_))));
}
