mod analysis;
mod display;
mod import;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::analysis::sampler::{generate_games, recommend, DEFAULT_MAX_ATTEMPTS};
use crate::analysis::{
    bet_cost, combined_scores, frequency_counts, top_numbers, Decay, DEFAULT_ALPHA,
    DEFAULT_DECAY_LAMBDA, DEFAULT_RECENT_WINDOW,
};
use crate::display::{
    display_games, display_import_summary, display_stats, display_top, export_games_csv,
    format_game,
};
use virada_db::cache::Store;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum DecayKind {
    #[default]
    Linear,
    Exp,
}

#[derive(Parser)]
#[command(name = "virada", about = "Gerador inteligente de jogos da Mega-Sena")]
struct Cli {
    /// Diretório de dados (cache e artefatos derivados)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importar o histórico de concursos a partir de um arquivo CSV
    Importar {
        /// Caminho para o arquivo CSV
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Gerar jogos ponderados pelo histórico (viés de dezenas frias)
    Gerar {
        /// Quantidade de jogos
        #[arg(short, long, default_value = "20")]
        quantidade: usize,

        /// Ignorar os filtros combinatórios
        #[arg(long)]
        forca: bool,

        /// Seed para a reprodutibilidade
        #[arg(long)]
        seed: Option<u64>,

        /// Teto de tentativas do laço de geração
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_tentativas: usize,

        /// Exportar os jogos para um CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Recomendar um único jogo
    Recomendar {
        /// Quantidade de dezenas (6-20)
        #[arg(short, long, default_value = "6")]
        qtd: usize,

        /// Ignorar os filtros combinatórios
        #[arg(long)]
        forca: bool,

        /// Seed para a reprodutibilidade
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Listar as dezenas com maior pontuação combinada
    Top {
        /// Quantidade de dezenas a listar
        #[arg(short, long, default_value = "10")]
        n: usize,

        /// Peso da frequência histórica (recência recebe 1-alpha)
        #[arg(long, default_value_t = DEFAULT_ALPHA)]
        alpha: f64,

        /// Janela de concursos recentes
        #[arg(short, long, default_value_t = DEFAULT_RECENT_WINDOW)]
        window: usize,

        /// Decaimento da recência
        #[arg(long, value_enum, default_value = "linear")]
        decay: DecayKind,

        /// Taxa do decaimento exponencial
        #[arg(long, default_value_t = DEFAULT_DECAY_LAMBDA)]
        lambda: f64,
    },

    /// Mostrar as frequências das dezenas
    Stats {
        /// Janela de concursos recentes
        #[arg(short, long, default_value_t = DEFAULT_RECENT_WINDOW)]
        window: usize,
    },

    /// Custo de uma aposta com N dezenas
    Custo { qtd: u32 },

    /// Mostrar o caminho do cache
    CachePath,
}

fn main() -> Result<()> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;
    let cli = Cli::parse();
    let store = Store::new(cli.data_dir.clone().unwrap_or_else(Store::default_dir));

    match cli.command {
        Command::Importar { file } => cmd_importar(&store, &file),
        Command::Gerar {
            quantidade,
            forca,
            seed,
            max_tentativas,
            csv,
        } => cmd_gerar(&store, quantidade, forca, seed, max_tentativas, csv),
        Command::Recomendar { qtd, forca, seed } => cmd_recomendar(&store, qtd, forca, seed),
        Command::Top {
            n,
            alpha,
            window,
            decay,
            lambda,
        } => cmd_top(&store, n, alpha, window, decay, lambda),
        Command::Stats { window } => cmd_stats(&store, window),
        Command::Custo { qtd } => {
            println!("Aposta com {} dezenas: R$ {}", qtd, bet_cost(qtd));
            Ok(())
        }
        Command::CachePath => {
            println!("{}", store.cache_path().display());
            Ok(())
        }
    }
}

fn cmd_importar(store: &Store, file: &PathBuf) -> Result<()> {
    let result = import::import_file(store, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_gerar(
    store: &Store,
    quantidade: usize,
    forca: bool,
    seed: Option<u64>,
    max_tentativas: usize,
    csv: Option<PathBuf>,
) -> Result<()> {
    let history = store.load_history()?;
    if history.is_empty() {
        log::warn!("Cache vazio; geração uniforme, sem viés do histórico.");
    }

    let games = generate_games(&history, quantidade, forca, seed, max_tentativas)?;
    display_games(&games);

    if let Some(path) = csv {
        export_games_csv(&games, &path)?;
        println!("CSV salvo: {}", path.display());
    }
    Ok(())
}

fn cmd_recomendar(store: &Store, qtd: usize, forca: bool, seed: Option<u64>) -> Result<()> {
    let history = store.load_history()?;
    let game = recommend(&history, qtd, forca, seed)?;
    println!("Recomendação: {}", format_game(&game));
    let cost = bet_cost(qtd as u32);
    if cost > 0 {
        println!("Custo estimado: R$ {}", cost);
    }
    Ok(())
}

fn cmd_top(
    store: &Store,
    n: usize,
    alpha: f64,
    window: usize,
    decay: DecayKind,
    lambda: f64,
) -> Result<()> {
    let history = store.load_history()?;
    if history.is_empty() {
        println!("Cache vazio. Execute primeiro: virada importar --file <csv>");
        return Ok(());
    }

    let (decay, model_name) = match decay {
        DecayKind::Linear => (Decay::Linear, format!("α={}, janela={}, linear", alpha, window)),
        DecayKind::Exp => (
            Decay::Exp { lambda },
            format!("α={}, janela={}, exp λ={}", alpha, window, lambda),
        ),
    };

    let scores = combined_scores(&history, alpha, window, decay);
    display_top(&top_numbers(&scores, n), &model_name);
    Ok(())
}

fn cmd_stats(store: &Store, window: usize) -> Result<()> {
    let history = store.load_history()?;
    if history.is_empty() {
        println!("Cache vazio. Execute primeiro: virada importar --file <csv>");
        return Ok(());
    }

    let counts = frequency_counts(&history);
    let recent_start = history.len().saturating_sub(window);
    let recent_counts = frequency_counts(&history[recent_start..]);
    display_stats(&counts, &recent_counts, window.min(history.len()));
    Ok(())
}
