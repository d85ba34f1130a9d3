#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use geodata_core::command::{CommandOutput, CommandRunner, CommandSpec};
use geodata_core::lfs::{ATTRIBUTES_FILE, lfs_rule_line};
use geodata_core::Result;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const RELEASE_PATH: &str = "/MichJRC/my-first-binder/releases/download/v1.0.0";

#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub user_agent: Option<String>,
}

/// Local stand-in for the GitHub release download endpoint.
pub struct ReleaseServer {
    base_url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl ReleaseServer {
    pub fn start(assets: Vec<(&str, Vec<u8>)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind test server");
        let port = server
            .server_addr()
            .to_ip()
            .expect("ip listen addr")
            .port();
        let assets: HashMap<String, Vec<u8>> = assets
            .into_iter()
            .map(|(name, body)| (format!("{RELEASE_PATH}/{name}"), body))
            .collect();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&hits);
        thread::spawn(move || {
            for request in server.incoming_requests() {
                let path = request.url().to_string();
                let user_agent = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("User-Agent"))
                    .map(|header| header.value.as_str().to_string());
                recorded.lock().expect("hits lock").push(Hit {
                    path: path.clone(),
                    user_agent,
                });
                let _ = match assets.get(&path) {
                    Some(body) => request.respond(tiny_http::Response::from_data(body.clone())),
                    None => request.respond(
                        tiny_http::Response::from_string("Not Found").with_status_code(404),
                    ),
                };
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{port}{RELEASE_PATH}"),
            hits,
        }
    }

    pub fn url(&self, asset: &str) -> String {
        format!("{}/{asset}", self.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().expect("hits lock").clone()
    }
}

/// Serves one response whose body stops well short of its `Content-Length`,
/// then closes the connection. Returns the URL to request.
pub fn truncated_body_server(asset: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind truncating server");
    let port = listener.local_addr().expect("local addr").port();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\nConnection: close\r\n\r\npartial",
            );
            let _ = stream.flush();
        }
    });
    format!("http://127.0.0.1:{port}{RELEASE_PATH}/{asset}")
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).expect("add dir");
        } else {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(body).expect("write entry");
        }
    }
    writer.finish().expect("finish zip").into_inner()
}

/// The parcel archive as published: a shapefile bundle in one folder.
pub fn parcel_archive() -> Vec<u8> {
    zip_bytes(&[
        ("GSA2024LB/", b""),
        ("GSA2024LB/GSA-2024_Lombardia.shp", b"shp-bytes"),
        ("GSA2024LB/GSA-2024_Lombardia.dbf", b"dbf-bytes"),
        ("GSA2024LB/GSA-2024_Lombardia.prj", b"prj-bytes"),
    ])
}

pub fn geopackage() -> Vec<u8> {
    b"SQLite format 3\0fake geopackage".to_vec()
}

/// Relative path -> contents for every file under `root`.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(root, root, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).expect("relative").to_path_buf();
            files.insert(relative, fs::read(&path).expect("read file"));
        }
    }
}

/// Records commands instead of spawning them.
///
/// Succeeds by default. `git lfs track <path>` appends the LFS rule to
/// `.gitattributes` like the real command, and `git diff --cached --quiet`
/// reports staged changes (exit 1) unless overridden.
pub struct FakeRunner {
    calls: RefCell<Vec<String>>,
    overrides: RefCell<HashMap<String, CommandOutput>>,
    write_attributes: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            overrides: RefCell::new(HashMap::new()),
            write_attributes: true,
        }
    }

    /// A runner whose `git lfs track` exits 0 without touching `.gitattributes`.
    pub fn without_attribute_writes() -> Self {
        Self {
            write_attributes: false,
            ..Self::new()
        }
    }

    pub fn respond(&self, command: &str, output: CommandOutput) {
        self.overrides
            .borrow_mut()
            .insert(command.to_string(), output);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, workdir: &Path, command: &CommandSpec) -> Result<CommandOutput> {
        let rendered = command.to_string();
        self.calls.borrow_mut().push(rendered.clone());
        if let Some(output) = self.overrides.borrow().get(&rendered) {
            return Ok(output.clone());
        }
        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        match (command.program.as_str(), args.as_slice()) {
            ("git", ["lfs", "track", path]) if self.write_attributes => {
                let attributes = workdir.join(ATTRIBUTES_FILE);
                let mut contents = fs::read_to_string(&attributes).unwrap_or_default();
                contents.push_str(&lfs_rule_line(path));
                contents.push('\n');
                fs::write(&attributes, contents).expect("write attributes");
                Ok(CommandOutput::success())
            }
            ("git", ["diff", "--cached", "--quiet"]) => Ok(CommandOutput {
                status: Some(1),
                ..CommandOutput::default()
            }),
            _ => Ok(CommandOutput::success()),
        }
    }
}
