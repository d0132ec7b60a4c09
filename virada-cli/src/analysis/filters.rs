use virada_db::models::DRAW_SIZE;

const PRIMES: [u8; 17] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59];

/// Filtros combinatórios sobre um jogo ordenado. Puro e determinístico:
/// o veredito depende apenas do jogo e do histórico.
pub fn passes_filters(game: &[u8], history: &[[u8; DRAW_SIZE]]) -> bool {
    // no máximo 3 dezenas pares
    let evens = game.iter().filter(|&&d| d % 2 == 0).count();
    if evens >= 4 {
        return false;
    }

    // nenhuma trinca consecutiva (a, a+1, a+2)
    if game
        .windows(3)
        .any(|w| w[1] == w[0] + 1 && w[2] == w[1] + 1)
    {
        return false;
    }

    // nenhum final (mod 10) repetido mais de duas vezes
    let mut endings = [0u8; 10];
    for &d in game {
        endings[(d % 10) as usize] += 1;
    }
    if endings.iter().any(|&c| c > 2) {
        return false;
    }

    // pelo menos 4 décadas distintas
    let mut decades = [false; 6];
    for &d in game {
        let idx = ((d.saturating_sub(1)) / 10) as usize;
        if idx < decades.len() {
            decades[idx] = true;
        }
    }
    if decades.iter().filter(|&&hit| hit).count() < 4 {
        return false;
    }

    // soma dentro da faixa histórica usual
    let sum: u32 = game.iter().map(|&d| d as u32).sum();
    if !(100..=250).contains(&sum) {
        return false;
    }

    // no máximo 4 primos
    if game.iter().filter(|&d| PRIMES.contains(d)).count() > 4 {
        return false;
    }

    // jogo idêntico a um concurso já sorteado
    if game.len() == DRAW_SIZE && history.iter().any(|past| past[..] == game[..]) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_balanced_game() {
        assert!(passes_filters(&[5, 12, 23, 34, 45, 56], &[]));
    }

    #[test]
    fn test_rejects_too_many_evens() {
        assert!(!passes_filters(&[2, 4, 6, 8, 10, 12], &[]));
        assert!(!passes_filters(&[2, 4, 6, 8, 11, 23], &[]));
    }

    #[test]
    fn test_rejects_consecutive_run() {
        assert!(!passes_filters(&[10, 11, 12, 20, 30, 40], &[]));
    }

    #[test]
    fn test_rejects_repeated_endings() {
        // finais 9, 9, 9
        assert!(!passes_filters(&[9, 19, 29, 34, 45, 56], &[]));
    }

    #[test]
    fn test_rejects_few_decades() {
        // apenas duas décadas (21-30 e 31-40)
        assert!(!passes_filters(&[21, 23, 25, 32, 34, 36], &[]));
    }

    #[test]
    fn test_rejects_sum_out_of_range() {
        assert!(!passes_filters(&[1, 2, 4, 11, 23, 35], &[]));
        assert!(!passes_filters(&[27, 39, 45, 53, 57, 59], &[]));
    }

    #[test]
    fn test_rejects_too_many_primes() {
        assert!(!passes_filters(&[5, 13, 23, 31, 47, 59], &[]));
    }

    #[test]
    fn test_rejects_historical_game() {
        let history = vec![[5, 12, 23, 34, 45, 56]];
        assert!(!passes_filters(&[5, 12, 23, 34, 45, 56], &history));
        assert!(passes_filters(&[5, 12, 23, 34, 45, 58], &history));
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let history = vec![[1, 2, 13, 24, 35, 46]];
        let game = [5, 12, 23, 34, 45, 56];
        assert_eq!(
            passes_filters(&game, &history),
            passes_filters(&game, &history)
        );
    }
}
