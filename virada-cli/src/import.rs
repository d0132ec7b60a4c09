use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::analysis::{self, Decay, DEFAULT_ALPHA, DEFAULT_RECENT_WINDOW};
use virada_db::cache::{Store, Summary};
use virada_db::models::{validate_numbers, Draw, DRAW_SIZE, POOL_SIZE};

static DATE_DMY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4}$").expect("regex de data válida"));
static DATE_YMD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("regex de data válida"));

const CONTEST_TOKENS: [&str; 6] = ["concurso", "nr", "numero", "n_conc", "num_conc", "concurso_num"];
const DATE_TOKENS: [&str; 3] = ["data", "dt", "sorteio"];

/// Colunas inferidas de uma tabela de layout desconhecido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub numbers: [usize; DRAW_SIZE],
    pub contest: Option<usize>,
    pub date: Option<usize>,
}

pub struct ImportResult {
    pub total_rows: usize,
    pub accepted: usize,
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn parse_dezena(s: &str) -> Option<u8> {
    s.trim()
        .parse::<u8>()
        .ok()
        .filter(|d| (1..=POOL_SIZE).contains(d))
}

fn looks_like_date(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && (DATE_DMY_RE.is_match(s) || DATE_YMD_RE.is_match(s))
}

fn width(rows: &[Vec<String>]) -> usize {
    rows.iter().map(|r| r.len()).max().unwrap_or(0)
}

fn data_rows(rows: &[Vec<String>], has_header: bool) -> &[Vec<String>] {
    if has_header && !rows.is_empty() {
        &rows[1..]
    } else {
        rows
    }
}

/// Um rótulo casa com a posição `pos` (1..=6) quando começa com
/// d{pos}/d0{pos}/dezena/dez ou contém d{pos}, v{pos} ou o próprio dígito.
fn header_matches_position(label: &str, pos: usize) -> bool {
    label.starts_with(&format!("d{}", pos))
        || label.starts_with(&format!("d{:02}", pos))
        || label.starts_with("dezena")
        || label.starts_with("dez")
        || label.contains(&format!("d{}", pos))
        || label.contains(&format!("v{}", pos))
        || label.contains(&pos.to_string())
}

fn detect_numbers_by_header(header: &[String]) -> Option<[usize; DRAW_SIZE]> {
    let labels: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    for start in 0..labels.len() {
        if start + DRAW_SIZE > labels.len() {
            break;
        }
        let run_ok =
            (0..DRAW_SIZE).all(|j| header_matches_position(&labels[start + j], j + 1));
        if run_ok {
            let mut columns = [0usize; DRAW_SIZE];
            for (j, column) in columns.iter_mut().enumerate() {
                *column = start + j;
            }
            return Some(columns);
        }
    }
    None
}

fn dezena_counts(rows: &[Vec<String>], has_header: bool) -> Vec<usize> {
    let cols = width(rows);
    let mut counts = vec![0usize; cols];
    for row in data_rows(rows, has_header) {
        for (ci, count) in counts.iter_mut().enumerate() {
            if parse_dezena(cell(row, ci)).is_some() {
                *count += 1;
            }
        }
    }
    counts
}

/// Fallback por conteúdo: colunas ranqueadas por quantidade de valores
/// 1..=60 (empate pelo índice menor); se menos de 6 colunas qualificam,
/// a primeira janela de 6 colunas consecutivas com contagem somada de
/// pelo menos 10% das linhas de dados vence.
fn detect_numbers_by_content(
    rows: &[Vec<String>],
    has_header: bool,
) -> Option<[usize; DRAW_SIZE]> {
    let counts = dezena_counts(rows, has_header);
    let total_rows = rows.len().saturating_sub(1).max(1);

    let mut indexed: Vec<(usize, usize)> = counts.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut selected: Vec<usize> = indexed
        .iter()
        .filter(|(_, count)| *count > 0)
        .take(DRAW_SIZE)
        .map(|(i, _)| *i)
        .collect();
    selected.sort_unstable();
    if selected.len() == DRAW_SIZE {
        let mut columns = [0usize; DRAW_SIZE];
        columns.copy_from_slice(&selected);
        return Some(columns);
    }

    if counts.len() >= DRAW_SIZE {
        for start in 0..=(counts.len() - DRAW_SIZE) {
            let score: usize = counts[start..start + DRAW_SIZE].iter().sum();
            if score as f64 >= total_rows as f64 * 0.1 {
                let mut columns = [0usize; DRAW_SIZE];
                for (j, column) in columns.iter_mut().enumerate() {
                    *column = start + j;
                }
                return Some(columns);
            }
        }
    }
    None
}

fn detect_column_by_header(header: &[String], tokens: &[&str]) -> Option<usize> {
    header.iter().position(|h| {
        let label = h.trim().to_lowercase();
        tokens.iter().any(|token| label.contains(token))
    })
}

fn detect_column_by_content<F>(rows: &[Vec<String>], has_header: bool, matches: F) -> Option<usize>
where
    F: Fn(&str) -> bool,
{
    let cols = width(rows);
    let mut counts = vec![0usize; cols];
    for row in data_rows(rows, has_header) {
        for (ci, count) in counts.iter_mut().enumerate() {
            if matches(cell(row, ci)) {
                *count += 1;
            }
        }
    }
    let (best, &best_count) = counts
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
    if best_count > 0 {
        Some(best)
    } else {
        None
    }
}

fn is_positive_integer(s: &str) -> bool {
    s.trim().parse::<i64>().map(|v| v > 0).unwrap_or(false)
}

pub fn detect_columns(rows: &[Vec<String>], has_header: bool) -> Option<ColumnLayout> {
    let header = if has_header { rows.first() } else { None };

    let numbers = header
        .and_then(|h| detect_numbers_by_header(h))
        .or_else(|| detect_numbers_by_content(rows, has_header))?;

    let contest = header
        .and_then(|h| detect_column_by_header(h, &CONTEST_TOKENS))
        .or_else(|| detect_column_by_content(rows, has_header, is_positive_integer));

    let date = header
        .and_then(|h| detect_column_by_header(h, &DATE_TOKENS))
        .or_else(|| detect_column_by_content(rows, has_header, looks_like_date));

    Some(ColumnLayout {
        numbers,
        contest,
        date,
    })
}

/// Materializa o histórico: uma linha só vira concurso quando as 6 colunas
/// inferidas contêm dezenas válidas e distintas; linhas inválidas são
/// descartadas em silêncio. Tabela sem colunas reconhecíveis resulta em
/// histórico vazio, que é um estado válido.
pub fn infer_history(rows: &[Vec<String>], has_header: bool) -> Vec<Draw> {
    let Some(layout) = detect_columns(rows, has_header) else {
        return Vec::new();
    };

    let mut draws = Vec::new();
    for row in data_rows(rows, has_header) {
        let mut numbers = [0u8; DRAW_SIZE];
        let mut complete = true;
        for (slot, &ci) in layout.numbers.iter().enumerate() {
            match parse_dezena(cell(row, ci)) {
                Some(d) => numbers[slot] = d,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if !complete {
            continue;
        }
        numbers.sort_unstable();
        if validate_numbers(&numbers).is_err() {
            continue;
        }

        let contest = layout
            .contest
            .and_then(|ci| cell(row, ci).parse::<u32>().ok());
        let date = layout
            .date
            .map(|ci| cell(row, ci).to_string())
            .filter(|s| !s.is_empty());

        draws.push(Draw {
            contest,
            date,
            numbers,
        });
    }

    if !draws.is_empty() && draws.iter().all(|d| d.contest.is_some()) {
        draws.sort_by_key(|d| d.contest);
    }
    draws
}

/// Lê um CSV para uma grade de células, detectando o separador pela
/// primeira linha (`;` ou `,`). Bytes fora de UTF-8 são substituídos,
/// como nos arquivos ISO-8859-1 da Caixa.
pub fn read_csv_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let bytes =
        fs::read(path).with_context(|| format!("Não foi possível abrir {:?}", path))?;
    let raw = String::from_utf8_lossy(&bytes);

    let delimiter = if raw.lines().next().is_some_and(|line| line.contains(';')) {
        b';'
    } else {
        b','
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(false)
        .from_reader(raw.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else {
            continue;
        };
        rows.push(record.iter().map(|s| s.trim().to_string()).collect());
    }
    Ok(rows)
}

pub fn import_file(store: &Store, path: &Path) -> Result<ImportResult> {
    let rows = read_csv_grid(path)?;
    let total_rows = rows.len().saturating_sub(1);
    let draws = infer_history(&rows, true);

    store.save_history(&draws)?;
    store.write_standard_csv(&draws)?;

    let history: Vec<[u8; DRAW_SIZE]> = draws.iter().map(|d| d.numbers).collect();
    store.write_frequency_csv(&analysis::frequency_counts(&history))?;
    let recent_start = history.len().saturating_sub(DEFAULT_RECENT_WINDOW);
    store.write_recent_frequency_csv(&analysis::frequency_counts(&history[recent_start..]))?;

    let scores =
        analysis::combined_scores(&history, DEFAULT_ALPHA, DEFAULT_RECENT_WINDOW, Decay::Linear);
    store.write_summary(&Summary {
        total_contests: draws.len(),
        last_date: draws.last().and_then(|d| d.date.clone()),
        last_contest: draws.last().and_then(|d| d.contest),
        top10: analysis::top_numbers(&scores, 10),
    })?;

    log::info!("Histórico salvo ({} concursos).", draws.len());
    Ok(ImportResult {
        total_rows,
        accepted: draws.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_header_run_detection() {
        let rows = grid(&[
            &["id", "data", "d1", "d2", "d3", "d4", "d5", "d6"],
            &["100", "01/01/2024", "5", "12", "23", "34", "45", "56"],
        ]);
        let layout = detect_columns(&rows, true).unwrap();
        assert_eq!(layout.numbers, [2, 3, 4, 5, 6, 7]);
        assert_eq!(layout.contest, Some(0));
        assert_eq!(layout.date, Some(1));

        let draws = infer_history(&rows, true);
        assert_eq!(
            draws,
            vec![Draw {
                contest: Some(100),
                date: Some("01/01/2024".to_string()),
                numbers: [5, 12, 23, 34, 45, 56],
            }]
        );
    }

    #[test]
    fn test_header_detection_prefers_first_run() {
        let rows = grid(&[
            &["d1", "d2", "d3", "d4", "d5", "d6", "b1", "b2", "b3", "b4", "b5", "b6"],
            &["1", "12", "23", "34", "45", "56", "2", "13", "24", "35", "46", "57"],
        ]);
        let layout = detect_columns(&rows, true).unwrap();
        assert_eq!(layout.numbers, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_content_fallback_without_header() {
        let rows = grid(&[
            &["2001", "5", "12", "23", "34", "45", "56"],
            &["2002", "1", "2", "13", "24", "35", "46"],
        ]);
        let layout = detect_columns(&rows, false).unwrap();
        assert_eq!(layout.numbers, [1, 2, 3, 4, 5, 6]);
        // identificadores grandes não são dezenas, mas são inteiros positivos
        assert_eq!(layout.contest, Some(0));

        let draws = infer_history(&rows, false);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].contest, Some(2001));
    }

    #[test]
    fn test_content_fallback_window_tie_break() {
        // só 5 colunas com dezenas: a primeira janela de 6 colunas vence
        let rows = grid(&[
            &["x", "5", "12", "23", "34", "45"],
            &["x", "1", "2", "13", "24", "35"],
        ]);
        let layout = detect_columns(&rows, false).unwrap();
        assert_eq!(layout.numbers, [0, 1, 2, 3, 4, 5]);
        // a coluna "x" nunca parseia, então nenhuma linha materializa
        assert!(infer_history(&rows, false).is_empty());
    }

    #[test]
    fn test_rows_with_invalid_cells_are_dropped() {
        let rows = grid(&[
            &["concurso", "data", "d1", "d2", "d3", "d4", "d5", "d6"],
            &["1", "01/01/2024", "5", "12", "23", "34", "45", "56"],
            &["2", "02/01/2024", "5", "12", "23", "34", "45", "xx"],
            &["3", "03/01/2024", "5", "12", "23", "34", "45", "99"],
            &["4", "04/01/2024", "5", "5", "23", "34", "45", "56"],
            &["5", "05/01/2024", "1", "2", "13", "24", "35"],
        ]);
        let draws = infer_history(&rows, true);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].contest, Some(1));
    }

    #[test]
    fn test_numbers_are_stored_sorted() {
        let rows = grid(&[
            &["concurso", "data", "d1", "d2", "d3", "d4", "d5", "d6"],
            &["1", "01/01/2024", "56", "5", "45", "12", "34", "23"],
        ]);
        let draws = infer_history(&rows, true);
        assert_eq!(draws[0].numbers, [5, 12, 23, 34, 45, 56]);
    }

    #[test]
    fn test_ordering_by_contest_when_all_present() {
        let rows = grid(&[
            &["concurso", "data", "d1", "d2", "d3", "d4", "d5", "d6"],
            &["30", "", "5", "12", "23", "34", "45", "56"],
            &["10", "", "1", "2", "13", "24", "35", "46"],
            &["20", "", "3", "14", "25", "36", "47", "58"],
        ]);
        let draws = infer_history(&rows, true);
        let contests: Vec<_> = draws.iter().map(|d| d.contest).collect();
        assert_eq!(contests, vec![Some(10), Some(20), Some(30)]);
    }

    #[test]
    fn test_source_order_kept_when_contest_missing() {
        let rows = grid(&[
            &["concurso", "data", "d1", "d2", "d3", "d4", "d5", "d6"],
            &["30", "", "5", "12", "23", "34", "45", "56"],
            &["", "", "1", "2", "13", "24", "35", "46"],
            &["10", "", "3", "14", "25", "36", "47", "58"],
        ]);
        let draws = infer_history(&rows, true);
        let contests: Vec<_> = draws.iter().map(|d| d.contest).collect();
        assert_eq!(contests, vec![Some(30), None, Some(10)]);
    }

    #[test]
    fn test_unrecognizable_table_yields_empty_history() {
        let rows = grid(&[&["a", "b"], &["x", "y"]]);
        assert!(infer_history(&rows, true).is_empty());
    }

    #[test]
    fn test_looks_like_date() {
        assert!(looks_like_date("01/01/2024"));
        assert!(looks_like_date("1/1/24"));
        assert!(looks_like_date("2024-01-01"));
        assert!(!looks_like_date("13 de maio"));
        assert!(!looks_like_date("123456"));
        assert!(!looks_like_date(""));
    }

    #[test]
    fn test_read_csv_grid_sniffs_delimiter() {
        let dir = tempfile::tempdir().unwrap();

        let semi = dir.path().join("semi.csv");
        fs::write(&semi, "a;b;c\n1;2;3\n").unwrap();
        let rows = read_csv_grid(&semi).unwrap();
        assert_eq!(rows[0], vec!["a", "b", "c"]);

        let comma = dir.path().join("comma.csv");
        fs::write(&comma, "a,b,c\n1,2,3\n").unwrap();
        let rows = read_csv_grid(&comma).unwrap();
        assert_eq!(rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_standard_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let draws = vec![
            Draw::new(Some(10), Some("01/01/2024".to_string()), [1, 2, 13, 24, 35, 46])
                .unwrap(),
            Draw::new(Some(20), Some("02/01/2024".to_string()), [5, 12, 23, 34, 45, 56])
                .unwrap(),
        ];
        let path = store.write_standard_csv(&draws).unwrap();

        let rows = read_csv_grid(&path).unwrap();
        let reloaded = infer_history(&rows, true);
        assert_eq!(reloaded, draws);
    }

    #[test]
    fn test_import_file_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("historico.csv");
        fs::write(
            &csv_path,
            "Concurso;Data;D1;D2;D3;D4;D5;D6\n\
             2;02/01/2024;5;12;23;34;45;56\n\
             1;01/01/2024;1;2;13;24;35;46\n",
        )
        .unwrap();

        let store = Store::new(dir.path().join("data"));
        let result = import_file(&store, &csv_path).unwrap();
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.accepted, 2);

        // cache ordenado por concurso
        let history = store.load_history().unwrap();
        assert_eq!(history, vec![[1, 2, 13, 24, 35, 46], [5, 12, 23, 34, 45, 56]]);
        assert!(store.data_dir().join("mega_full.csv").is_file());
        assert!(store.data_dir().join("mega_freq.csv").is_file());
        assert!(store.data_dir().join("mega_freq_recent.csv").is_file());
        assert!(store.data_dir().join("mega_summary.json").is_file());
    }
}
