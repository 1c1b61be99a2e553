use clap::Parser;
use mapquiz::{ClickOutcome, GameConfig, GameMode, RoundState, Session, WorldCatalogue};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// Викторина по карте: проигрывает раунд по списку кликов
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Каталог регионов (JSON или TOML)
    #[arg(long)]
    catalogue: PathBuf,

    /// Регион, по потомкам которого идёт раунд (по умолчанию: корень мира)
    #[arg(short, long)]
    region: Option<String>,

    /// Режим: name, capital, leader или flag
    #[arg(short, long, default_value = "name")]
    mode: GameMode,

    /// Файл с кликами, по строке `x y` (по умолчанию: stdin)
    #[arg(long)]
    clicks: Option<PathBuf>,

    /// Снять все задания, кроме последнего, до первого клика
    #[arg(long)]
    reveal: bool,

    /// Сохранить итоговую карту раунда в PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Только показать доступные режимы
    #[arg(long)]
    modes: bool,
}

fn parse_click(line: &str) -> Option<(u32, u32)> {
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    Some((x, y))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    println!("🔍 Загрузка конфигурации...");
    let config = match &cli.config {
        Some(path) => GameConfig::from_toml_file(path)?,
        None => GameConfig::default(),
    };
    let catalogue = WorldCatalogue::from_file(&cli.catalogue)?;
    let region = match cli.region {
        Some(region) => region,
        None => catalogue
            .root()
            .map(|r| r.name.clone())
            .ok_or("каталог пуст")?,
    };

    let mut session = Session::from_config(config, Box::new(catalogue), &region)?;
    println!("Регион: {}", session.breadcrumb());

    if cli.modes {
        for mode in GameMode::ALL {
            let mark = if session.is_mode_available(mode) { "да" } else { "нет" };
            println!("  {mode}: {mark}");
        }
        return Ok(());
    }

    let round = session.start_round(cli.mode)?;
    println!(
        "Раунд {} начат: {} заданий",
        cli.mode,
        round.snapshot().remaining
    );

    if cli.reveal {
        let revealed = session.reveal()?;
        println!("Снято заданий: {revealed}");
    }

    let mut input = String::new();
    match &cli.clicks {
        Some(path) => input = fs::read_to_string(path)?,
        None => {
            io::stdin().read_to_string(&mut input)?;
        }
    }

    for line in input.lines().filter(|l| !l.trim().is_empty()) {
        let Some((x, y)) = parse_click(line) else {
            eprintln!("Пропуск строки: {line:?}");
            continue;
        };
        if let Some(head) = session.snapshot().and_then(|s| s.head) {
            println!("Найдите: {head}");
        }
        match session.click(x, y)? {
            ClickOutcome::Ignored => println!("({x}, {y}): мимо"),
            ClickOutcome::Correct { region, remaining } => {
                println!("({x}, {y}): {region} верно, осталось {remaining}");
            }
            ClickOutcome::Incorrect { region, mistakes } => {
                println!("({x}, {y}): {region} неверно, ошибок {mistakes}");
            }
            ClickOutcome::AlreadyFlagged { region } => {
                println!("({x}, {y}): {region} уже отмечен");
            }
            ClickOutcome::Won(summary) => {
                println!(
                    "\nПобеда! Найдено {} за {}, ошибок {}, очков {}",
                    summary.found,
                    summary.elapsed_text(),
                    summary.mistakes,
                    summary.score
                );
                break;
            }
        }
    }

    if let Some(path) = &cli.output {
        round.with(|engine| engine.surface().save_as_png(path))?;
        println!("Карта сохранена в {path:?}");
    }

    let state = session.stop_round()?;
    if state == RoundState::Loss {
        println!("\nРаунд не завершён");
    }
    println!("Готово!");
    Ok(())
}
