use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zips `<out_dir>/<sample>_contiglens/` into `<out_dir>/<sample>_contiglens.zip`
/// via a temp file, so a failed run never leaves a truncated archive behind.
pub fn write_zip(out_dir: &Path, sample_name: &str) -> Result<()> {
    let root = format!("{}_contiglens", sample_name);
    let zip_name = format!("{}.zip", root);
    let zip_path = out_dir.join(&zip_name);
    let tmp_path = out_dir.join(format!("{}.tmp", zip_name));

    let file = File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let result = write_zip_entries(&mut zip, out_dir, &root);

    match result.and_then(|_| zip.finish().with_context(|| "failed to finalize zip")) {
        Ok(_) => {
            fs::rename(&tmp_path, &zip_path)
                .with_context(|| format!("failed to move zip to {}", zip_path.display()))?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn write_zip_entries(zip: &mut ZipWriter<File>, out_dir: &Path, root: &str) -> Result<()> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0).unwrap());

    zip.add_directory(format!("{}/", root), options)
        .with_context(|| "failed to add directory entry to zip")?;

    let report_dir = out_dir.join(root);
    let mut entries: Vec<_> = fs::read_dir(&report_dir)
        .with_context(|| format!("failed to read {}", report_dir.display()))?
        .collect::<std::io::Result<_>>()
        .with_context(|| "failed to list report directory")?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let zip_entry = format!("{}/{}", root, name);
        add_file(zip, &entry.path(), &zip_entry, options)
            .with_context(|| format!("failed to add {} to zip", name))?;
    }
    Ok(())
}

fn add_file(
    zip: &mut ZipWriter<File>,
    src_path: &Path,
    zip_path: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut file =
        File::open(src_path).with_context(|| format!("failed to open {}", src_path.display()))?;
    zip.start_file(zip_path, options)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        zip.write_all(&buf[..n])?;
    }
    Ok(())
}
