use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// `rows` fifteen-minute XAUUSD candles in the split date/time layout, with a header.
pub fn dataset_csv(rows: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create dataset");
    writeln!(file, "date,time,open,high,low,close,volume").expect("write header");
    for i in 0..rows {
        let minutes = i * 15;
        let (hour, minute) = ((minutes / 60) % 24, minutes % 60);
        let day = 2 + minutes / (60 * 24);
        let base = 2000.0 + (i % 9) as f64;
        let (open, close) = if i % 3 == 0 {
            (base + 1.5, base)
        } else {
            (base, base + 1.5)
        };
        writeln!(
            file,
            "2024.01.{day:02},{hour:02}:{minute:02},{open:.2},{:.2},{:.2},{close:.2},120",
            open.max(close) + 0.75,
            open.min(close) - 0.75,
        )
        .expect("write row");
    }
    file.flush().expect("flush dataset");
    file
}

/// Config file with a small fleet and `dataset` as the training dataset.
pub fn config_toml(fleet_size: usize, dataset: Option<&Path>, extra: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create config");
    writeln!(file, "[logging]\nlevel = \"warn\"\n").expect("write logging");
    writeln!(file, "[fleet]\nsize = {fleet_size}\nseed = 11\n").expect("write fleet");
    writeln!(file, "[training]\nworkers = 2").expect("write training");
    if let Some(path) = dataset {
        writeln!(file, "dataset = {:?}", path.display().to_string()).expect("write dataset");
    }
    writeln!(file, "\n{extra}").expect("write extra");
    file.flush().expect("flush config");
    file
}
