use clap::Parser;
use color_eyre::Result;
use log::LevelFilter;
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use tabula::{App, AppConfig, AppEvent, Args, ConfigManager, TableOptions, Theme};

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    mut terminal: DefaultTerminal,
    mut app: App,
    path: PathBuf,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
) -> Result<()> {
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Open(path))?;

    loop {
        if crossterm::event::poll(std::time::Duration::from_millis(25))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(tabula::APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Configuration written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error generating config: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let config = AppConfig::load(tabula::APP_NAME)?;
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        config.debug.level_filter()?
    };
    if let Err(e) = tabula::logging::init(tabula::APP_NAME, level) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let options = TableOptions::from_args_and_config(&args, &config)?;
    let Some(path) = args.path.clone() else {
        return Err(color_eyre::eyre::eyre!("A data file path is required"));
    };

    if let Some(out) = &args.export {
        let count = tabula::export_table(&options, &path, out)?;
        println!("Wrote {} records to {}", count, out.display());
        return Ok(());
    }

    let theme = Theme::from_config(&config.theme)?;
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), theme, options);
    if args.debug || config.debug.enabled {
        app.enable_debug();
    }

    let terminal = ratatui::init();
    let result = run(terminal, app, path, tx, rx);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
