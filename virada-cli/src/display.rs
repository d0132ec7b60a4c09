use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::analysis::POOL;
use crate::import::ImportResult;

pub fn format_game(game: &[u8]) -> String {
    game.iter()
        .map(|d| format!("{:02}", d))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_games(games: &[Vec<u8>]) {
    if games.is_empty() {
        println!("Nenhum jogo para exibir.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Dezenas"]);

    for (i, game) in games.iter().enumerate() {
        table.add_row(vec![format!("{:02}", i + 1), format_game(game)]);
    }
    println!("{table}");
}

pub fn display_top(top: &[(u8, f64)], model_name: &str) {
    println!("\n🎯 Dezenas mais pontuadas ({model_name})\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Dezena", "Pontuação"]);

    for (number, score) in top {
        table.add_row(vec![format!("{:2}", number), format!("{:.4}", score)]);
    }
    println!("{table}");
}

pub fn display_stats(counts: &[u32; POOL], recent_counts: &[u32; POOL], window: usize) {
    println!("\n📊 Frequências (janela recente de {} concursos)\n", window);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Dezena", "Frequência", "Freq. recente"]);

    let mut order: Vec<usize> = (0..POOL).collect();
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]).then(a.cmp(&b)));

    for i in order {
        table.add_row(vec![
            format!("{:2}", i + 1),
            counts[i].to_string(),
            recent_counts[i].to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Importação concluída:");
    println!("  Linhas de dados lidas : {}", result.total_rows);
    println!("  Concursos aceitos     : {}", result.accepted);
    let rejected = result.total_rows.saturating_sub(result.accepted);
    if rejected > 0 {
        println!("  Linhas descartadas    : {}", rejected);
    }
}

/// Exporta os jogos no formato `Numero;D1;...;D6`.
pub fn export_games_csv(games: &[Vec<u8>], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("Não foi possível gravar {:?}", path))?;
    writer.write_record(["Numero", "D1", "D2", "D3", "D4", "D5", "D6"])?;
    for (i, game) in games.iter().enumerate() {
        let mut record = vec![format!("{:02}", i + 1)];
        record.extend(game.iter().map(|d| format!("{:02}", d)));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
