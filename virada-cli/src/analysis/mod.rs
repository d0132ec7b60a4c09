pub mod filters;
pub mod sampler;

use virada_db::models::{DRAW_SIZE, POOL_SIZE};

pub const POOL: usize = POOL_SIZE as usize;

pub const DEFAULT_ALPHA: f64 = 0.6;
pub const DEFAULT_RECENT_WINDOW: usize = 100;
pub const DEFAULT_DECAY_LAMBDA: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decay {
    Linear,
    Exp { lambda: f64 },
}

pub fn frequency_counts(history: &[[u8; DRAW_SIZE]]) -> [u32; POOL] {
    let mut counts = [0u32; POOL];
    for game in history {
        for &d in game {
            let idx = (d as usize).wrapping_sub(1);
            if idx < POOL {
                counts[idx] += 1;
            }
        }
    }
    counts
}

/// Normaliza pelo máximo: a dezena mais frequente pontua 1.0.
/// Histórico vazio resulta em zeros para todas as dezenas.
pub fn frequency_scores(history: &[[u8; DRAW_SIZE]]) -> [f64; POOL] {
    let counts = frequency_counts(history);
    let mut scores = [0.0f64; POOL];
    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return scores;
    }
    for (score, &count) in scores.iter_mut().zip(counts.iter()) {
        *score = count as f64 / max as f64;
    }
    scores
}

/// Componente de recência sobre os últimos `window` concursos.
/// Linear: o mais antigo da janela pesa 1, o mais novo pesa o tamanho da
/// janela. Exponencial: peso exp(-lambda * distância_do_mais_novo).
pub fn recency_scores(history: &[[u8; DRAW_SIZE]], window: usize, decay: Decay) -> [f64; POOL] {
    let start = history.len().saturating_sub(window);
    let recent = &history[start..];
    let len = recent.len();

    let mut raw = [0.0f64; POOL];
    for (pos, game) in recent.iter().enumerate() {
        let weight = match decay {
            Decay::Linear => (pos + 1) as f64,
            Decay::Exp { lambda } => (-lambda * (len - 1 - pos) as f64).exp(),
        };
        for &d in game {
            let idx = (d as usize).wrapping_sub(1);
            if idx < POOL {
                raw[idx] += weight;
            }
        }
    }

    normalize_by_max(raw)
}

pub fn combined_scores(
    history: &[[u8; DRAW_SIZE]],
    alpha: f64,
    window: usize,
    decay: Decay,
) -> [f64; POOL] {
    let freq = frequency_scores(history);
    let rec = recency_scores(history, window, decay);

    let mut scores = [0.0f64; POOL];
    for i in 0..POOL {
        scores[i] = alpha * freq[i] + (1.0 - alpha) * rec[i];
    }
    normalize_by_max(scores)
}

fn normalize_by_max(mut scores: [f64; POOL]) -> [f64; POOL] {
    let max = scores.iter().copied().fold(0.0f64, f64::max);
    if max <= 0.0 {
        return [0.0; POOL];
    }
    for score in &mut scores {
        *score /= max;
    }
    scores
}

/// Ordena por pontuação decrescente, desempate pela dezena menor.
pub fn top_numbers(scores: &[f64; POOL], n: usize) -> Vec<(u8, f64)> {
    let mut ranked: Vec<(u8, f64)> = scores
        .iter()
        .enumerate()
        .map(|(i, &s)| ((i + 1) as u8, s))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(n);
    ranked
}

/// Custo em reais de uma aposta com `count` dezenas: 6 * C(count, 6)
/// para 6..=20 dezenas, 0 fora desse intervalo.
pub fn bet_cost(count: u32) -> u64 {
    if !(6..=20).contains(&count) {
        return 0;
    }
    6 * binomial(count as u64, 6)
}

fn binomial(n: u64, k: u64) -> u64 {
    let k = k.min(n - k);
    let mut result = 1u64;
    for i in 0..k {
        result = result * (n - k + 1 + i) / (i + 1);
    }
    result
}
