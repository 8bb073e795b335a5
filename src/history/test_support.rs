//! Zip fixtures for unit tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

pub type Stamp = (u16, u8, u8, u8, u8, u8);

pub const DEFAULT_STAMP: Stamp = (2001, 1, 1, 12, 0, 0);

enum FixtureEntry {
    File {
        name: String,
        body: Vec<u8>,
        stamp: Stamp,
    },
    Dir {
        name: String,
    },
}

#[derive(Default)]
pub struct ZipFixture {
    entries: Vec<FixtureEntry>,
}

fn options(stamp: Stamp) -> SimpleFileOptions {
    let (year, month, day, hour, minute, second) = stamp;
    let at = zip::DateTime::from_date_and_time(year, month, day, hour, minute, second)
        .expect("fixture stamp in DOS range");
    SimpleFileOptions::default().last_modified_time(at)
}

impl ZipFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(self, name: &str, body: &str) -> Self {
        self.file_at(name, body, DEFAULT_STAMP)
    }

    pub fn file_at(mut self, name: &str, body: &str, stamp: Stamp) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            body: body.as_bytes().to_vec(),
            stamp,
        });
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.entries.push(FixtureEntry::Dir {
            name: name.to_string(),
        });
        self
    }

    pub fn write(&self, path: &Path) {
        let file = File::create(path).expect("create zip");
        let mut writer = zip::ZipWriter::new(file);
        for entry in &self.entries {
            match entry {
                FixtureEntry::File { name, body, stamp } => {
                    writer
                        .start_file(name.as_str(), options(*stamp))
                        .expect("start file");
                    writer.write_all(body).expect("write body");
                }
                FixtureEntry::Dir { name } => {
                    writer
                        .add_directory(name.as_str(), options(DEFAULT_STAMP))
                        .expect("add dir");
                }
            }
        }
        writer.finish().expect("finish zip");
    }
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    entries
        .iter()
        .fold(ZipFixture::new(), |fixture, (name, body)| fixture.file(name, body))
        .write(path);
}
