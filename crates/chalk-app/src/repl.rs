//! Terminal chat over a single in-process session.

use std::path::{Path, PathBuf};

use chalk_chat::{ChatOrchestrator, Command, CommandOutcome, ConversationSession, Rating, Role};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const HELP: &str = "\
Escribí tu consulta y presioná Enter. Comandos:
  /attach <ruta>                     adjuntar un PDF o Word a la próxima consulta
  /clear                             quitar el documento adjunto
  /feedback <n> up|down [comentario] calificar la respuesta n
  /export <n> [carpeta]              guardar la respuesta n como informe Word
  /retry                             reintentar la consulta pendiente
  /quit                              salir";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Message(String),
    Attach(PathBuf),
    Clear,
    Feedback {
        index: usize,
        rating: Rating,
        comment: Option<String>,
    },
    Export {
        index: usize,
        dir: PathBuf,
    },
    Retry,
    Help,
    Quit,
}

impl ReplInput {
    pub fn parse(line: &str) -> Result<ReplInput, String> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(ReplInput::Message(line.to_string()));
        };

        let (cmd, args) = match rest.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd, args.trim()),
            None => (rest, ""),
        };
        match cmd {
            "attach" if !args.is_empty() => Ok(ReplInput::Attach(PathBuf::from(args))),
            "attach" => Err("uso: /attach <ruta>".to_string()),
            "clear" => Ok(ReplInput::Clear),
            "feedback" => {
                let mut parts = args.splitn(3, char::is_whitespace);
                let index = parse_index(parts.next())?;
                let rating = parts
                    .next()
                    .ok_or_else(|| "uso: /feedback <n> up|down [comentario]".to_string())?
                    .parse::<Rating>()?;
                let comment = parts
                    .next()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty());
                Ok(ReplInput::Feedback {
                    index,
                    rating,
                    comment,
                })
            }
            "export" => {
                let mut parts = args.splitn(2, char::is_whitespace);
                let index = parse_index(parts.next())?;
                let dir = parts
                    .next()
                    .map(|d| PathBuf::from(d.trim()))
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok(ReplInput::Export { index, dir })
            }
            "retry" => Ok(ReplInput::Retry),
            "help" | "?" => Ok(ReplInput::Help),
            "quit" | "exit" => Ok(ReplInput::Quit),
            other => Err(format!("comando desconocido: /{}", other)),
        }
    }
}

fn parse_index(arg: Option<&str>) -> Result<usize, String> {
    arg.filter(|a| !a.is_empty())
        .ok_or_else(|| "falta el número de respuesta".to_string())?
        .parse::<usize>()
        .map_err(|_| "el número de respuesta no es válido".to_string())
}

/// Run the chat loop until `/quit` or end of input.
pub async fn run(
    orchestrator: &ChatOrchestrator,
    document: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = orchestrator.new_session();
    let mut rl = DefaultEditor::new()?;

    println!("=== Asistente Legal Laboral - Perfumistas ===");
    println!("Escribí /help para ver los comandos.");
    println!();

    if let Some(path) = document {
        attach(orchestrator, &mut session, &path).await;
    }

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        match ReplInput::parse(&line) {
            Ok(ReplInput::Quit) => break,
            Ok(input) => handle(orchestrator, &mut session, input).await,
            Err(msg) => eprintln!("{}", msg),
        }
    }

    tracing::info!(
        session_id = %session.id(),
        turns = session.transcript().len(),
        "Chat session ended"
    );
    Ok(())
}

async fn handle(orchestrator: &ChatOrchestrator, session: &mut ConversationSession, input: ReplInput) {
    match input {
        ReplInput::Message(text) => match orchestrator.send(session, &text).await {
            Ok(Some(index)) => print_answer(session, index),
            Ok(None) => {}
            Err(e) => {
                eprintln!("Error: {}", e);
                if session.transcript().has_pending_turn() {
                    eprintln!("La consulta quedó pendiente; usá /retry para reintentar.");
                }
            }
        },
        ReplInput::Attach(path) => attach(orchestrator, session, &path).await,
        ReplInput::Clear => match orchestrator.dispatch(session, Command::ClearDocument).await {
            Ok(CommandOutcome::Cleared { had_document: true }) => println!("Documento quitado."),
            Ok(_) => println!("No había documento adjunto."),
            Err(e) => eprintln!("Error: {}", e),
        },
        ReplInput::Feedback {
            index,
            rating,
            comment,
        } => {
            let command = Command::Feedback {
                turn_index: index,
                rating,
                comment,
            };
            match orchestrator.dispatch(session, command).await {
                Ok(_) => println!("¡Gracias por tu feedback!"),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        ReplInput::Export { index, dir } => match export(orchestrator, session, index, &dir) {
            Ok(path) => println!("Informe guardado en {}", path.display()),
            Err(e) => eprintln!("Error: {}", e),
        },
        ReplInput::Retry => match orchestrator.dispatch(session, Command::ResolvePending).await {
            Ok(CommandOutcome::Resolved { index }) => print_answer(session, index),
            Ok(_) => println!("No hay ninguna consulta pendiente."),
            Err(e) => eprintln!("Error: {}", e),
        },
        ReplInput::Help => println!("{}", HELP),
        ReplInput::Quit => {}
    }
}

async fn attach(orchestrator: &ChatOrchestrator, session: &mut ConversationSession, path: &Path) {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("No se pudo leer {}: {}", path.display(), e);
            return;
        }
    };
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let command = Command::AttachDocument {
        filename,
        content_type: None,
        bytes,
    };
    match orchestrator.dispatch(session, command).await {
        Ok(CommandOutcome::Attached {
            filename, chars, ..
        }) => println!(
            "Documento {} listo ({} caracteres); se enviará con la próxima consulta.",
            filename, chars
        ),
        Ok(_) => {}
        Err(e) => eprintln!("No se pudo procesar el documento: {}", e),
    }
}

fn export(
    orchestrator: &ChatOrchestrator,
    session: &ConversationSession,
    index: usize,
    dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let report = orchestrator.export_turn(session, index)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&report.filename);
    std::fs::write(&path, &report.bytes)?;
    Ok(path)
}

fn print_answer(session: &ConversationSession, index: usize) {
    if let Some(turn) = session.transcript().get(index) {
        if turn.role() == Role::Assistant {
            println!();
            println!("[{}] {}", index, turn.display_text());
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            ReplInput::parse("  ¿Cuál es la categoría mínima?  ").unwrap(),
            ReplInput::Message("¿Cuál es la categoría mínima?".into())
        );
    }

    #[test]
    fn test_attach_and_clear() {
        assert_eq!(
            ReplInput::parse("/attach docs/recibo marzo.pdf").unwrap(),
            ReplInput::Attach(PathBuf::from("docs/recibo marzo.pdf"))
        );
        assert!(ReplInput::parse("/attach").is_err());
        assert_eq!(ReplInput::parse("/clear").unwrap(), ReplInput::Clear);
    }

    #[test]
    fn test_feedback_with_comment() {
        assert_eq!(
            ReplInput::parse("/feedback 2 down falta citar el artículo").unwrap(),
            ReplInput::Feedback {
                index: 2,
                rating: Rating::Negative,
                comment: Some("falta citar el artículo".into())
            }
        );
        assert_eq!(
            ReplInput::parse("/feedback 4 up").unwrap(),
            ReplInput::Feedback {
                index: 4,
                rating: Rating::Positive,
                comment: None
            }
        );
    }

    #[test]
    fn test_feedback_errors() {
        assert!(ReplInput::parse("/feedback").is_err());
        assert!(ReplInput::parse("/feedback dos up").is_err());
        assert!(ReplInput::parse("/feedback 2").is_err());
        assert!(ReplInput::parse("/feedback 2 meh").is_err());
    }

    #[test]
    fn test_export_default_dir() {
        assert_eq!(
            ReplInput::parse("/export 2").unwrap(),
            ReplInput::Export {
                index: 2,
                dir: PathBuf::from(".")
            }
        );
        assert_eq!(
            ReplInput::parse("/export 2 informes").unwrap(),
            ReplInput::Export {
                index: 2,
                dir: PathBuf::from("informes")
            }
        );
    }

    #[test]
    fn test_control_commands() {
        assert_eq!(ReplInput::parse("/retry").unwrap(), ReplInput::Retry);
        assert_eq!(ReplInput::parse("/quit").unwrap(), ReplInput::Quit);
        assert_eq!(ReplInput::parse("/exit").unwrap(), ReplInput::Quit);
        assert_eq!(ReplInput::parse("/help").unwrap(), ReplInput::Help);
        assert!(ReplInput::parse("/bogus").is_err());
    }
}
