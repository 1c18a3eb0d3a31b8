use editor::{
    backend::{Backend, HttpBackend},
    config::EditorConfig,
    interaction::DragController,
    presentation::{HexColor, LOCKED_COLOR, fill_color, heat_color, summarize},
    session::{EditorError, EditorSession, Notice},
    view_model::ViewModel,
};
use importer::store::{FileTableStore, MemoryTableStore, TableStore};
use log::{info, warn};
use models::timetable::Cell;
use std::sync::Arc;

/// Width of one printed grid column
const COLUMN_WIDTH: usize = 14;

/// Renders the grid as text, one line per period and one column per room
///
/// # Arguments
/// * `view` - The schedule to print
/// * `drag` - Gesture in progress, whose drop target is printed with its tint
/// * `rooms` - Room labels, printed as the header row
/// * `periods` - Period labels, printed in the first column
fn render_grid(
    view: &ViewModel,
    drag: &DragController,
    rooms: &[String],
    periods: &[String],
) -> String {
    let shape = view.shape();
    let mut grid = vec![vec![String::new(); shape.room_size]; shape.period_size];

    for cell in view.cells() {
        let placement = cell.placement();
        let color = fill_color(&cell, drag, true);
        let text = match &cell {
            Cell::Active(active) => {
                let marker = if active.is_violated() { "!" } else { "" };
                format!("{}{marker} {color}", active.class_name)
            }
            Cell::Blank(_) if color == HexColor::WHITE => ".".to_string(),
            Cell::Blank(_) => format!(". {color}"),
        };

        let coordinate = cell.coordinate();
        grid[coordinate.period][coordinate.room] = text;
        for span in 1..placement.column_span {
            if let Some(row) = grid.get_mut(coordinate.period + span) {
                row[coordinate.room] = "|".to_string();
            }
        }
    }

    let label = |labels: &[String], i: usize| {
        labels.get(i).cloned().unwrap_or_else(|| i.to_string())
    };

    let mut out = format!("{:COLUMN_WIDTH$}", "");
    for room in 0..shape.room_size {
        out.push_str(&format!("{:COLUMN_WIDTH$}", label(rooms, room)));
    }
    out.push('\n');

    for (period, row) in grid.iter().enumerate() {
        out.push_str(&format!("{:COLUMN_WIDTH$}", label(periods, period)));
        for text in row {
            out.push_str(&format!("{text:COLUMN_WIDTH$}"));
        }
        out.push('\n');
    }

    out
}

/// One line explaining the cell colors
fn legend() -> String {
    format!(
        "heat {} (low) to {} (high), locked {LOCKED_COLOR}, ! violated",
        heat_color(0),
        heat_color(u8::MAX)
    )
}

/// Imports the CSV tables, hands them to the backend and prints one generated schedule
async fn generate<S: TableStore>(
    session: &mut EditorSession<S>,
    config: &EditorConfig,
) -> Result<(), EditorError> {
    session.load_labels().await;
    session.import_csv_dir(&config.csv_dir)?;

    let normalized = session.submit_input().await?;
    for unresolved in &normalized.unresolved {
        warn!(
            "Class row {} names unknown {} '{}'",
            unresolved.class_row, unresolved.table, unresolved.name
        );
    }

    session.reset_input().await?;
    session.run_once().await?;

    info!("Received {} classes", session.view().active_cells().count());
    print!(
        "{}",
        render_grid(
            session.view(),
            session.drag(),
            session.rooms(),
            session.periods()
        )
    );
    println!("{}", legend());

    for cell in session.view().active_cells() {
        let display = summarize(cell.violations.as_ref());
        if display.is_violated {
            println!(
                "\n{} (room {}, period {})",
                cell.class_name, cell.room, cell.period
            );
            println!("{}", display.tooltip);
        }
    }

    Ok(())
}

/// Runs one round, returning every notice raised whether or not the round succeeded
async fn run<S: TableStore>(
    backend: Arc<dyn Backend>,
    store: S,
    config: &EditorConfig,
) -> (Vec<Notice>, Result<(), EditorError>) {
    let mut session = EditorSession::new(backend, store, config);
    let result = generate(&mut session, config).await;

    (session.take_notices(), result)
}

/// Orchestrates one import and generation round against the configured backend
#[tokio::main]
async fn main() {
    env_logger::init();

    let config = EditorConfig::from_env().expect("Invalid configuration");
    info!("Using backend at {}", config.backend_url);

    let backend = Arc::new(HttpBackend::new(config.backend_url.clone()));
    let (notices, result) = match &config.table_dir {
        Some(dir) => {
            let store = FileTableStore::open(dir).expect("Failed to open table directory");
            run(backend, store, &config).await
        }
        None => run(backend, MemoryTableStore::new(), &config).await,
    };

    for notice in &notices {
        eprintln!("{}: {}", notice.kind, notice.message);
    }
    result.expect("Failed to generate a timetable");
}
