use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Draw, DRAW_SIZE, POOL_SIZE};

pub const CACHE_FILE: &str = "mega_cache.json";
pub const FULL_CSV_FILE: &str = "mega_full.csv";
pub const FREQ_CSV_FILE: &str = "mega_freq.csv";
pub const FREQ_RECENT_CSV_FILE: &str = "mega_freq_recent.csv";
pub const SUMMARY_FILE: &str = "mega_summary.json";

#[derive(Debug, Serialize)]
pub struct Summary {
    #[serde(rename = "total_concursos")]
    pub total_contests: usize,
    #[serde(rename = "ultima_data")]
    pub last_date: Option<String>,
    #[serde(rename = "ultimo_concurso")]
    pub last_contest: Option<u32>,
    pub top10: Vec<(u8, f64)>,
}

/// Persistência em arquivos: cache canônico (JSON), tabela padronizada e
/// tabelas de frequência (CSV) e resumo (JSON).
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Store {
        Store {
            data_dir: data_dir.into(),
        }
    }

    pub fn default_dir() -> PathBuf {
        let mut path = std::env::current_dir().unwrap_or_default();
        path.push("data");
        path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Não foi possível criar o diretório {:?}", self.data_dir))
    }

    /// Cache ausente equivale a histórico vazio, não a erro.
    pub fn load_history(&self) -> Result<Vec<[u8; DRAW_SIZE]>> {
        let path = self.cache_path();
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Não foi possível ler o cache {:?}", path))?;
        let history: Vec<[u8; DRAW_SIZE]> = serde_json::from_str(&raw)
            .with_context(|| format!("Cache corrompido em {:?}", path))?;
        Ok(history)
    }

    /// Substitui o cache por inteiro (sem mesclagem incremental).
    pub fn save_history(&self, draws: &[Draw]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let history: Vec<[u8; DRAW_SIZE]> = draws.iter().map(|d| d.numbers).collect();
        let path = self.cache_path();
        let raw = serde_json::to_string(&history).context("Falha ao serializar o cache")?;
        fs::write(&path, raw)
            .with_context(|| format!("Não foi possível gravar o cache {:?}", path))?;
        Ok(path)
    }

    pub fn write_standard_csv(&self, draws: &[Draw]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.data_dir.join(FULL_CSV_FILE);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_path(&path)
            .with_context(|| format!("Não foi possível gravar {:?}", path))?;
        writer.write_record(["Concurso", "Data", "D1", "D2", "D3", "D4", "D5", "D6"])?;
        for draw in draws {
            let mut record = Vec::with_capacity(2 + DRAW_SIZE);
            record.push(draw.contest.map(|c| c.to_string()).unwrap_or_default());
            record.push(draw.date.clone().unwrap_or_default());
            for d in draw.numbers {
                record.push(d.to_string());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_frequency_csv(&self, counts: &[u32; POOL_SIZE as usize]) -> Result<PathBuf> {
        self.write_counts(FREQ_CSV_FILE, "freq", counts)
    }

    pub fn write_recent_frequency_csv(
        &self,
        counts: &[u32; POOL_SIZE as usize],
    ) -> Result<PathBuf> {
        self.write_counts(FREQ_RECENT_CSV_FILE, "freq_recente", counts)
    }

    fn write_counts(
        &self,
        file: &str,
        column: &str,
        counts: &[u32; POOL_SIZE as usize],
    ) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.data_dir.join(file);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_path(&path)
            .with_context(|| format!("Não foi possível gravar {:?}", path))?;
        writer.write_record(["dezena", column])?;
        for d in 1..=POOL_SIZE {
            writer.write_record([d.to_string(), counts[(d - 1) as usize].to_string()])?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_summary(&self, summary: &Summary) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.data_dir.join(SUMMARY_FILE);
        let raw =
            serde_json::to_string_pretty(summary).context("Falha ao serializar o resumo")?;
        fs::write(&path, raw)
            .with_context(|| format!("Não foi possível gravar o resumo {:?}", path))?;
        Ok(path)
    }
}
