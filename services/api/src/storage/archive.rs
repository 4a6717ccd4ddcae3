//! services/api/src/storage/archive.rs
//!
//! Packs a whole project folder into a ZIP archive. The archive is written to
//! an unnamed scratch file so downloads can stream it without holding it in memory.

use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds a ZIP of `folder` in a scratch file under `scratch_dir`, with entries
/// prefixed by `prefix`. The returned file is rewound and removed once closed.
pub async fn zip_folder(folder: PathBuf, prefix: String, scratch_dir: PathBuf) -> io::Result<File> {
    tokio::task::spawn_blocking(move || zip_folder_blocking(&folder, &prefix, &scratch_dir))
        .await
        .map_err(io::Error::other)?
}

fn zip_folder_blocking(folder: &Path, prefix: &str, scratch_dir: &Path) -> io::Result<File> {
    if !folder.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", folder.display()),
        ));
    }
    std::fs::create_dir_all(scratch_dir)?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));
    let mut zip = ZipWriter::new(tempfile::tempfile_in(scratch_dir)?);

    for entry in walkdir::WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let path = entry.path();
        let relative = path.strip_prefix(folder).map_err(io::Error::other)?;

        let mut name = prefix.to_string();
        for part in relative.components() {
            name.push('/');
            name.push_str(&part.as_os_str().to_string_lossy());
        }

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)
                .map_err(io::Error::other)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options).map_err(io::Error::other)?;
            let mut source = File::open(path)?;
            io::copy(&mut source, &mut zip)?;
        }
    }

    let mut file = zip.finish().map_err(io::Error::other)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}
