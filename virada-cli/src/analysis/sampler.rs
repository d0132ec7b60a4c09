use anyhow::{bail, Result};
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::filters::passes_filters;
use super::{frequency_counts, POOL};
use virada_db::models::DRAW_SIZE;

pub const DEFAULT_MAX_ATTEMPTS: usize = 1_000_000;
const RECOMMEND_RETRIES: usize = 1000;

/// Viés de dezenas frias: quanto menos uma dezena saiu, maior o peso.
pub fn inverse_weights(history: &[[u8; DRAW_SIZE]]) -> [f64; POOL] {
    let counts = frequency_counts(history);
    let total: u32 = counts.iter().sum();
    let total = total.max(1);

    let mut weights = [0.0f64; POOL];
    for (weight, &count) in weights.iter_mut().zip(counts.iter()) {
        *weight = (total - count) as f64 / total as f64;
    }
    weights
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

// Amostragem ponderada com reposição: o mesmo jogo pode conter dezenas
// repetidas, comportamento herdado do gerador original.
fn weighted_game(dist: &WeightedIndex<f64>, size: usize, rng: &mut StdRng) -> Vec<u8> {
    let mut game: Vec<u8> = (0..size).map(|_| dist.sample(rng) as u8 + 1).collect();
    game.sort_unstable();
    game
}

fn uniform_game(size: usize, rng: &mut StdRng) -> Vec<u8> {
    let mut game: Vec<u8> = rand::seq::index::sample(rng, POOL, size)
        .iter()
        .map(|i| i as u8 + 1)
        .collect();
    game.sort_unstable();
    game
}

fn sampling_dist(history: &[[u8; DRAW_SIZE]]) -> Result<Option<WeightedIndex<f64>>> {
    if history.is_empty() {
        return Ok(None);
    }
    let dist = WeightedIndex::new(inverse_weights(history))?;
    Ok(Some(dist))
}

fn draw_game(
    dist: Option<&WeightedIndex<f64>>,
    size: usize,
    rng: &mut StdRng,
) -> Vec<u8> {
    match dist {
        Some(dist) => weighted_game(dist, size, rng),
        None => uniform_game(size, rng),
    }
}

/// Gera `quantity` jogos de 6 dezenas aprovados pelos filtros (ou sem
/// filtros com `bypass_filters`). O laço tem um teto explícito de
/// tentativas; ao esgotá-lo a geração falha em vez de rodar para sempre.
pub fn generate_games(
    history: &[[u8; DRAW_SIZE]],
    quantity: usize,
    bypass_filters: bool,
    seed: Option<u64>,
    max_attempts: usize,
) -> Result<Vec<Vec<u8>>> {
    let mut rng = rng_from_seed(seed);
    let dist = sampling_dist(history)?;

    let mut games = Vec::with_capacity(quantity);
    let mut attempts = 0usize;
    while games.len() < quantity {
        if attempts >= max_attempts {
            bail!(
                "Não foi possível gerar {} jogos que passem nos filtros após {} tentativas",
                quantity,
                max_attempts
            );
        }
        attempts += 1;

        let game = draw_game(dist.as_ref(), DRAW_SIZE, &mut rng);
        if bypass_filters || passes_filters(&game, history) {
            games.push(game);
        }
    }
    Ok(games)
}

/// Recomendação única de `size` dezenas. Nunca falha por causa dos
/// filtros: após esgotar as tentativas devolve o último candidato,
/// mesmo que ele viole alguma regra.
pub fn recommend(
    history: &[[u8; DRAW_SIZE]],
    size: usize,
    bypass_filters: bool,
    seed: Option<u64>,
) -> Result<Vec<u8>> {
    if size > POOL {
        bail!("Quantidade de dezenas inválida: {}", size);
    }
    let mut rng = rng_from_seed(seed);
    let dist = sampling_dist(history)?;

    let mut game = draw_game(dist.as_ref(), size, &mut rng);
    if bypass_filters || passes_filters(&game, history) {
        return Ok(game);
    }
    for _ in 0..RECOMMEND_RETRIES {
        game = draw_game(dist.as_ref(), size, &mut rng);
        if bypass_filters || passes_filters(&game, history) {
            return Ok(game);
        }
    }
    Ok(game)
}
