use chrono::{DateTime, Utc};
use smugglers_game::{MatchReport, ReportStorage};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const REPORT_PREFIX: &str = "galaxy_smugglers_report_";

/// Stores match reports as pretty JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First unused file name for a report compiled at `stamp`.
    fn free_name(&self, stamp: &str) -> String {
        let base = format!("{REPORT_PREFIX}{stamp}");
        let mut name = format!("{base}.json");
        let mut n = 2;
        while self.dir.join(&name).exists() {
            name = format!("{base}_{n}.json");
            n += 1;
        }
        name
    }
}

/// `YYYYmmdd_HHMMSS` of the report timestamp, or of now when it cannot be parsed.
fn file_stamp(report: &MatchReport) -> String {
    DateTime::parse_from_rfc3339(&report.game_summary.timestamp)
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
        .format("%Y%m%d_%H%M%S")
        .to_string()
}

impl ReportStorage for JsonFileStorage {
    type Error = io::Error;

    fn save_report(&self, report: &MatchReport) -> Result<String, Self::Error> {
        fs::create_dir_all(&self.dir)?;
        let name = self.free_name(&file_stamp(report));
        let payload = report.to_json_pretty()?;
        fs::write(self.dir.join(&name), payload)?;
        Ok(name)
    }

    fn load_report(&self, name: &str) -> Result<Option<MatchReport>, Self::Error> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        let report = serde_json::from_str(&raw)?;
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smugglers_game::{GameEngine, MatchConfig};

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "smugglers-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn finished_report() -> MatchReport {
        let engine = GameEngine::new(JsonFileStorage::new(temp_dir("unused")));
        let mut session = engine
            .setup_match(MatchConfig::hangar_defaults(), 21)
            .unwrap();
        while !session.is_finished() {
            session.generate_round_missions().unwrap();
            session.skip_remaining().unwrap();
            session.resolve_round().unwrap();
        }
        let at = DateTime::parse_from_rfc3339("2025-07-04T18:05:09Z")
            .unwrap()
            .with_timezone(&Utc);
        session.compile_report_at(at).unwrap()
    }

    #[test]
    fn saves_with_timestamped_names_and_loads_back() {
        let storage = JsonFileStorage::new(temp_dir("save"));
        let report = finished_report();

        let first = storage.save_report(&report).unwrap();
        assert_eq!(first, "galaxy_smugglers_report_20250704_180509.json");
        let second = storage.save_report(&report).unwrap();
        assert_eq!(second, "galaxy_smugglers_report_20250704_180509_2.json");

        let loaded = storage.load_report(&first).unwrap().unwrap();
        assert_eq!(loaded, report);
        assert!(storage.load_report("missing.json").unwrap().is_none());
    }

    #[test]
    fn corrupt_files_surface_as_errors() {
        let storage = JsonFileStorage::new(temp_dir("corrupt"));
        fs::create_dir_all(storage.dir()).unwrap();
        fs::write(storage.dir().join("broken.json"), "{ not json").unwrap();
        assert!(storage.load_report("broken.json").is_err());
    }

    #[test]
    fn engine_refuses_to_save_unfinished_matches() {
        let engine = GameEngine::new(JsonFileStorage::new(temp_dir("engine")));
        let session = engine
            .setup_match(MatchConfig::crew_defaults(), 4)
            .unwrap();
        assert!(engine.save_report(&session).is_err());
        assert!(!engine.storage().dir().exists());
    }
}
