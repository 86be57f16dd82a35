use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use crate::input::MarketTables;
use crate::report::RunRecord;
use anyhow::{Context, Result, bail};
use glob::glob;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

const REPORT_FILE: &str = "report.csv";
const RECORD_FILE: &str = "record.msgpack";

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Simulate the input year in a new run directory.
    ///
    /// Without a `seed` one is drawn from the thread generator and logged.
    pub fn create_run(&self, seed: Option<u64>) -> Result<()> {
        let tables =
            MarketTables::load(&self.sim_dir, &self.cfg).context("failed to load input tables")?;

        let seed = seed.unwrap_or_else(|| rand::rng().random());
        log::info!("using seed {seed}");
        let rng = ChaCha12Rng::seed_from_u64(seed);

        let mut engine = Engine::generate_initial_condition(&self.cfg, &tables, rng)
            .context("failed to generate initial condition")?;
        let report = engine
            .perform_simulation(&tables.visitors)
            .context("failed to perform simulation")?;
        for row in report.rows() {
            log::info!("{row}");
        }

        let n_unplaced = engine
            .tourists()
            .iter()
            .filter(|tourist| tourist.chosen().is_none())
            .count();
        if n_unplaced > 0 {
            log::warn!("{n_unplaced} tourists never found a suitable accommodation");
        }

        let run_idx = self.next_run_idx().context("failed to find next run index")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let report_file = run_dir.join(REPORT_FILE);
        let file = File::create(&report_file)
            .with_context(|| format!("failed to create {report_file:?}"))?;
        report
            .write_csv(BufWriter::new(file))
            .context("failed to write report")?;

        RunRecord { seed, report }
            .save(run_dir.join(RECORD_FILE))
            .context("failed to save run record")?;

        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let run_dirs = self.run_dirs()?;
        if run_dirs.is_empty() {
            bail!("no runs to analyze in {:?}", self.sim_dir);
        }

        let mut analyzer = Analyzer::new();
        for run_dir in run_dirs {
            let record_file = run_dir.join(RECORD_FILE);
            analyzer
                .add_file(&record_file)
                .with_context(|| format!("failed to add {record_file:?}"))?;
        }

        let summary_file = self.summary_file();
        analyzer
            .save_results(&summary_file)
            .context("failed to save results")?;
        log::info!("summarized {} runs in {summary_file:?}", analyzer.n_runs());

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs()? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        let summary_file = self.summary_file();
        if summary_file.exists() {
            fs::remove_file(&summary_file)
                .with_context(|| format!("failed to remove {summary_file:?}"))?;
            log::info!("removed {summary_file:?}");
        }

        Ok(())
    }

    /// Existing run directories, sorted by index.
    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let mut dirs: Vec<_> = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir() && run_idx_of(p).is_some())
            .collect();
        dirs.sort_by_key(|p| run_idx_of(p));
        Ok(dirs)
    }

    /// One past the highest existing run index, so gaps are never reused.
    fn next_run_idx(&self) -> Result<usize> {
        let last = self.run_dirs()?.iter().filter_map(|p| run_idx_of(p)).max();
        Ok(last.map_or(0, |idx| idx + 1))
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn summary_file(&self) -> PathBuf {
        self.sim_dir.join("summary.csv")
    }
}

fn run_idx_of(run_dir: &Path) -> Option<usize> {
    run_dir
        .file_name()?
        .to_str()?
        .strip_prefix("run-")?
        .parse()
        .ok()
}
