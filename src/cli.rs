use crate::{widget::Widget, Args};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;

pub struct Context {
    pub args: Args,
    pub widget: RefCell<Widget>,
}

/// What the REPL should do after a command
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Exit,
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("codetrack - type /help for commands, /exit to quit");
    if let Some(path) = &ctx.args.config {
        println!("Config: {}", path.display());
    }
    println!();
    println!("{}", ctx.widget.borrow().render(Utc::now()));

    loop {
        match rl.readline(">>> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                match handle_command(&ctx, line, Utc::now()) {
                    Ok(Outcome::Exit) => break,
                    Ok(Outcome::Continue(text)) => println!("{}", text),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

fn help_text() -> String {
    [
        "Commands:",
        "  /exit                          - quit",
        "  /help                          - show commands",
        "  /status [json]                 - show all codes",
        "  /codes                         - list configured codes",
        "Check in:",
        "  /name <text>                   - set the name field",
        "  /duration <minutes>            - set the duration field",
        "  /code <code>                   - choose an available code",
        "  /checkin                       - submit the form",
        "  /checkin <name> <minutes> [code] - fill in and submit in one step",
        "  /clear                         - reset name and duration",
        "Check out:",
        "  /checkout <code>               - release a code",
        "Quote names and codes with spaces, e.g. /checkout \"Code A\"",
    ]
    .join("\n")
}

/// Parse and run one REPL line against the widget
pub fn handle_command(ctx: &Context, line: &str, now: DateTime<Utc>) -> Result<Outcome> {
    let (cmd, rest) = match line.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    let mut widget = ctx.widget.borrow_mut();
    let text = match cmd {
        "/exit" | "/quit" => return Ok(Outcome::Exit),
        "/help" => help_text(),
        "/status" => match rest {
            "" => widget.render(now),
            "json" => serde_json::to_string_pretty(&widget.tracker.snapshot())?,
            _ => return Err(anyhow!("Usage: /status [json]")),
        },
        "/codes" => widget
            .tracker
            .codes()
            .map(|c| {
                let state = if widget.is_available(c) {
                    "available"
                } else {
                    "in use"
                };
                format!("  {} ({})", c, state)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        "/name" => {
            widget.form.name = unquote(rest)?;
            widget.render(now)
        }
        "/duration" => {
            widget.form.duration = unquote(rest)?;
            widget.render(now)
        }
        "/code" => {
            let code = single_word(rest, "/code <code>")?;
            let w = &mut *widget;
            w.form.select(&code, &w.tracker)?;
            widget.render(now)
        }
        "/clear" => {
            widget.form.clear();
            widget.render(now)
        }
        "/checkin" => handle_checkin(&mut widget, rest, now)?,
        "/checkout" => {
            let code = single_word(rest, "/checkout <code>")?;
            let released = widget.check_out(&code)?;
            let note = match released {
                Some(r) => format!("{} checked out of {}", r.occupant, code),
                None => format!("{} was already available", code),
            };
            format!("{}\n\n{}", note, widget.render(now))
        }
        _ => return Err(anyhow!("Unknown command: {} (try /help)", cmd)),
    };
    Ok(Outcome::Continue(text))
}

/// Field text with shell-style quotes removed; words are rejoined with one space
fn unquote(args: &str) -> Result<String> {
    Ok(shell_words::split(args)?.join(" "))
}

fn single_word(args: &str, usage: &str) -> Result<String> {
    let mut words = shell_words::split(args)?;
    if words.len() != 1 {
        return Err(anyhow!("Usage: {}", usage));
    }
    Ok(words.remove(0))
}

fn handle_checkin(widget: &mut Widget, args: &str, now: DateTime<Utc>) -> Result<String> {
    let words = shell_words::split(args)?;
    if !widget.form_visible() {
        return Ok(format!(
            "No codes available; check one out first\n\n{}",
            widget.render(now)
        ));
    }

    match words.as_slice() {
        [] => {}
        [name, minutes] => {
            widget.form.name = name.clone();
            widget.form.duration = minutes.clone();
        }
        [name, minutes, code] => {
            let w = &mut *widget;
            w.form.select(code, &w.tracker)?;
            w.form.name = name.clone();
            w.form.duration = minutes.clone();
        }
        _ => return Err(anyhow!("Usage: /checkin [<name> <minutes> [code]]")),
    }

    if !widget.form.can_submit() {
        return Ok(format!(
            "Check In is disabled: enter a name and a positive duration in minutes\n\n{}",
            widget.render(now)
        ));
    }

    let note = match widget.check_in(now)? {
        Some((code, reservation)) => format!(
            "{} checked in to {} until {}",
            reservation.occupant,
            code,
            crate::render::format_time(reservation.expires_at, &widget.display)
        ),
        None => "Check-in ignored".to_string(),
    };
    Ok(format!("{}\n\n{}", note, widget.render(now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::TimeZone;
    use clap::Parser;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn context() -> Context {
        let mut config = Config::with_default_codes();
        config.display.utc = true;
        Context {
            args: Args::parse_from(["codetrack"]),
            widget: RefCell::new(Widget::new(&config)),
        }
    }

    fn run(ctx: &Context, line: &str) -> String {
        match handle_command(ctx, line, start()).unwrap() {
            Outcome::Continue(text) => text,
            Outcome::Exit => panic!("unexpected exit"),
        }
    }

    #[test]
    fn test_exit_commands() {
        let ctx = context();
        assert_eq!(handle_command(&ctx, "/exit", start()).unwrap(), Outcome::Exit);
        assert_eq!(handle_command(&ctx, "/quit", start()).unwrap(), Outcome::Exit);
    }

    #[test]
    fn test_unknown_command() {
        let ctx = context();
        assert!(handle_command(&ctx, "/dance", start()).is_err());
    }

    #[test]
    fn test_form_fields_then_checkin() {
        let ctx = context();
        run(&ctx, "/name Alice Smith");
        run(&ctx, "/duration 30");
        run(&ctx, "/code \"Code C\"");
        let out = run(&ctx, "/checkin");

        assert!(out.starts_with("Alice Smith checked in to Code C until 12:30:00 PM"));
        let widget = ctx.widget.borrow();
        assert_eq!(
            widget.tracker.reservation("Code C").unwrap().occupant,
            "Alice Smith"
        );
        assert!(widget.form.name.is_empty());
        assert!(widget.form.duration.is_empty());
    }

    #[test]
    fn test_quoted_name_and_duration_are_unquoted() {
        let ctx = context();
        run(&ctx, "/name \"Alice Smith\"");
        run(&ctx, "/duration '30'");
        let out = run(&ctx, "/checkin");

        assert!(out.starts_with("Alice Smith checked in to Code A until 12:30:00 PM"));
        assert_eq!(
            ctx.widget.borrow().tracker.reservation("Code A").unwrap().occupant,
            "Alice Smith"
        );
    }

    #[test]
    fn test_unbalanced_quote_in_name_is_rejected() {
        let ctx = context();
        assert!(handle_command(&ctx, "/name \"Alice", start()).is_err());
        assert!(ctx.widget.borrow().form.name.is_empty());
    }

    #[test]
    fn test_one_line_checkin_and_checkout() {
        let ctx = context();
        let out = run(&ctx, "/checkin Bob 45 'Code B'");
        assert!(out.contains("Bob checked in to Code B"));
        assert!(out.contains("2 of 3 codes available"));

        let out = run(&ctx, "/checkout 'Code B'");
        assert!(out.starts_with("Bob checked out of Code B"));
        assert!(out.contains("3 of 3 codes available"));

        let out = run(&ctx, "/checkout 'Code B'");
        assert!(out.starts_with("Code B was already available"));
    }

    #[test]
    fn test_disabled_checkin_keeps_fields() {
        let ctx = context();
        run(&ctx, "/name Alice");
        run(&ctx, "/duration soon");
        let out = run(&ctx, "/checkin");
        assert!(out.starts_with("Check In is disabled"));

        let widget = ctx.widget.borrow();
        assert_eq!(widget.form.name, "Alice");
        assert_eq!(widget.form.duration, "soon");
        assert_eq!(widget.available_count(), 3);
    }

    #[test]
    fn test_checkin_rejects_occupied_code() {
        let ctx = context();
        run(&ctx, "/checkin Bob 45 'Code A'");
        assert!(handle_command(&ctx, "/checkin Carol 10 'Code A'", start()).is_err());
        assert!(handle_command(&ctx, "/code 'Code A'", start()).is_err());
        assert_eq!(
            ctx.widget.borrow().tracker.reservation("Code A").unwrap().occupant,
            "Bob"
        );
    }

    #[test]
    fn test_checkin_when_full() {
        let ctx = context();
        run(&ctx, "/checkin A 10 'Code A'");
        run(&ctx, "/checkin B 10 'Code B'");
        let out = run(&ctx, "/checkin C 10");
        assert!(out.contains("C checked in to Code C"));
        assert!(!out.contains("\nCheck In\n"));

        let out = run(&ctx, "/checkin D 10");
        assert!(out.starts_with("No codes available"));
    }

    #[test]
    fn test_status_json() {
        let ctx = context();
        run(&ctx, "/checkin Bob 45 'Code B'");
        let out = run(&ctx, "/status json");
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["available"], 2);
        assert_eq!(value["total"], 3);
        assert_eq!(value["codes"][1]["occupant"], "Bob");
        assert_eq!(value["codes"][0]["available"], true);
    }

    #[test]
    fn test_checkout_usage() {
        let ctx = context();
        assert!(handle_command(&ctx, "/checkout", start()).is_err());
        assert!(handle_command(&ctx, "/checkout 'Code Z'", start()).is_err());
    }

    #[test]
    fn test_clear_resets_fields() {
        let ctx = context();
        run(&ctx, "/name Dana");
        run(&ctx, "/duration 15");
        run(&ctx, "/clear");
        let widget = ctx.widget.borrow();
        assert!(widget.form.name.is_empty());
        assert!(widget.form.duration.is_empty());
    }
}
