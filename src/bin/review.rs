use anyhow::Result;
use chrono::prelude::*;
use clap::Parser;
use cursive::style::{BorderStyle, Palette};
use cursive::traits::*;
use cursive::views::{Dialog, EditView, LinearLayout, SelectView, TextView};
use cursive::Cursive;
use cursive::CursiveExt;
use env_logger::Target;
use flashcard_reviewer::client::{self, Client, DEFAULT_URL};
use flashcard_reviewer::log_dir;
use flashcard_reviewer::Card;
use log::{error, info};
use shadow_rs::shadow;
use std::collections::VecDeque;
use std::fs::OpenOptions;

shadow!(build);

static FRONT: &str = "front";
static BACK: &str = "back";

#[derive(Parser)]
#[command(disable_version_flag = true)]
struct Args {
    /// review server
    #[arg(long, env = "FLASHCARDS_URL", default_value = DEFAULT_URL)]
    url: String,

    #[arg(long, default_value_t = false)]
    version: bool,
}

struct Session {
    client: Client,
    queue: VecDeque<Card>,
}

#[derive(Clone, Copy)]
enum MenuItem {
    Review,
    Add,
    All,
    Upcoming,
    Export,
    Quit,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.version {
        println!("{}", build::VERSION); //print version const
        return Ok(());
    }

    let local: DateTime<Local> = Local::now();
    let log_path = log_dir()?.join(format!("review.{}", local.to_rfc3339()));
    let log_file = Box::new(
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?,
    );
    println!("log file: {:?}", log_path);
    env_logger::Builder::from_default_env()
        .target(Target::Pipe(log_file))
        .filter_level(log::LevelFilter::Info) // Set the minimum log level
        .init();

    let mut siv = Cursive::default();
    siv.set_user_data(Session {
        client: Client::new(&args.url),
        queue: VecDeque::new(),
    });

    siv.set_theme(cursive::theme::Theme {
        shadow: true,
        borders: BorderStyle::Simple,
        palette: Palette::retro().with(|palette| {
            use cursive::style::BaseColor::*;
            use cursive::style::Color::TerminalDefault;
            use cursive::style::PaletteColor::*;

            palette[Background] = TerminalDefault;
            palette[View] = TerminalDefault;
            palette[Primary] = White.dark();
            palette[TitlePrimary] = Blue.light();
            palette[Secondary] = Blue.light();
            palette[Highlight] = Blue.dark();
        }),
    });

    siv.add_fullscreen_layer(main_menu());
    siv.run();
    Ok(())
}

fn main_menu() -> Dialog {
    let menu = SelectView::new()
        .item("Review cards", MenuItem::Review)
        .item("Add new card", MenuItem::Add)
        .item("Show all cards", MenuItem::All)
        .item("Show upcoming reviews", MenuItem::Upcoming)
        .item("Export cards to CSV", MenuItem::Export)
        .item("Exit", MenuItem::Quit)
        .on_submit(|s, item: &MenuItem| match item {
            MenuItem::Review => start_review(s),
            MenuItem::Add => add_card_form(s),
            MenuItem::All => show_cards(s, "All cards", Client::all_cards),
            MenuItem::Upcoming => show_cards(s, "Upcoming reviews", Client::upcoming),
            MenuItem::Export => export(s),
            MenuItem::Quit => s.quit(),
        });
    Dialog::around(menu).title("Flashcards")
}

fn session_client(s: &mut Cursive) -> Option<Client> {
    s.user_data::<Session>().map(|session| session.client.clone())
}

fn report(s: &mut Cursive, err: client::ClientError) {
    error!("{err}");
    s.add_layer(Dialog::info(err.to_string()).title("Error"));
}

fn start_review(s: &mut Cursive) {
    let Some(client) = session_client(s) else { return };
    match client.due_cards() {
        Ok(cards) if cards.is_empty() => {
            s.add_layer(Dialog::info("No cards available for review."));
        }
        Ok(cards) => {
            info!("reviewing {} cards", cards.len());
            s.with_user_data(|session: &mut Session| session.queue = cards.into());
            review_next(s);
        }
        Err(e) => report(s, e),
    }
}

fn review_next(s: &mut Cursive) {
    let next = s
        .with_user_data(|session: &mut Session| session.queue.pop_front())
        .flatten();
    match next {
        Some(card) => show_front(s, card),
        None => s.add_layer(Dialog::info("Review finished.")),
    }
}

fn show_front(s: &mut Cursive, card: Card) {
    let front = card.front.clone();
    s.add_layer(
        Dialog::around(TextView::new(front))
            .title(format!("Card {}", card.id))
            .button("Show answer", move |s| {
                s.pop_layer();
                show_back(s, &card);
            })
            .button("Skip", |s| {
                s.pop_layer();
                review_next(s);
            })
            .button("Stop", |s| {
                s.with_user_data(|session: &mut Session| session.queue.clear());
                s.pop_layer();
            }),
    );
}

fn show_back(s: &mut Cursive, card: &Card) {
    let layout = LinearLayout::vertical()
        .child(TextView::new(card.front.clone()))
        .child(TextView::new("─".repeat(20)))
        .child(TextView::new(card.back.clone()))
        .child(TextView::new(" "))
        .child(TextView::new("Rate your recall (1 is hardest, 5 is easiest)"));

    let mut dialog = Dialog::around(layout).title(format!("Card {}", card.id));
    for rating in 1..=5 {
        let id = card.id;
        dialog.add_button(rating.to_string(), move |s| rate(s, id, rating));
    }
    s.add_layer(dialog);
}

fn rate(s: &mut Cursive, card_id: i64, rating: i64) {
    s.pop_layer();
    let Some(client) = session_client(s) else { return };
    match client.submit_review(card_id, rating) {
        Ok(card) => info!(
            "card {card_id} rated {rating}, next review in {}d",
            card.memory_state.interval
        ),
        Err(e) => report(s, e),
    }
    review_next(s);
}

fn add_card_form(s: &mut Cursive) {
    let form = LinearLayout::vertical()
        .child(TextView::new("Front (question/prompt)"))
        .child(EditView::new().with_name(FRONT).fixed_width(60))
        .child(TextView::new("Back (answer/explanation)"))
        .child(EditView::new().with_name(BACK).fixed_width(60));

    s.add_layer(
        Dialog::around(form)
            .title("Add new card")
            .button("Add", |s| {
                let front = s
                    .call_on_name(FRONT, |v: &mut EditView| v.get_content())
                    .unwrap_or_default();
                let back = s
                    .call_on_name(BACK, |v: &mut EditView| v.get_content())
                    .unwrap_or_default();
                let Some(client) = session_client(s) else { return };
                match client.add_card(&front, &back) {
                    Ok(id) => {
                        s.pop_layer();
                        s.add_layer(Dialog::info(format!("Card {id} added.")));
                    }
                    Err(e) => report(s, e),
                }
            })
            .button("Cancel", |s| {
                s.pop_layer();
            }),
    );
}

fn describe(card: &Card) -> String {
    let state = &card.memory_state;
    format!(
        "#{} {}\n    {}\n    due {} | interval {}d | reps {} | ease {:.2}",
        card.id,
        card.front,
        card.back,
        state.due_date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        state.interval,
        state.repetitions,
        state.ease_factor
    )
}

fn show_cards(
    s: &mut Cursive,
    title: &str,
    fetch: fn(&Client) -> client::Result<Vec<Card>>,
) {
    let Some(client) = session_client(s) else { return };
    match fetch(&client) {
        Ok(cards) => {
            let text = if cards.is_empty() {
                "No cards.".to_owned()
            } else {
                cards.iter().map(describe).collect::<Vec<_>>().join("\n\n")
            };
            s.add_layer(
                Dialog::around(TextView::new(text).scrollable())
                    .title(title)
                    .button("Back", |s| {
                        s.pop_layer();
                    }),
            );
        }
        Err(e) => report(s, e),
    }
}

fn export(s: &mut Cursive) {
    let Some(client) = session_client(s) else { return };
    match client.export() {
        Ok(filename) => s.add_layer(Dialog::info(format!("Exported to {filename}"))),
        Err(e) => report(s, e),
    }
}
