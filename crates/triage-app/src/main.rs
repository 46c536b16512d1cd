//! Triage application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Install the tracing subscriber
//! 3. Build the dialogue engine (with the remote phrasing adapter if enabled)
//! 4. Run the selected command: terminal chat, HTTP server, or transcript scoring
//!
//! The engine is built outside any async runtime because the phrasing
//! adapter uses a blocking HTTP client.

mod cli;

use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::Parser;
use serde::Deserialize;

use triage_api::auth;
use triage_api::state::AppState;
use triage_core::config::TriageConfig;
use triage_core::error::TriageError;
use triage_core::types::{Message, Role};
use triage_dialog::{
    Conversation, DialogEngine, DialogError, SummaryGenerator, TriageOrchestrator, TriageScorer,
};

use cli::{ChatArgs, CliArgs, Command};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = if config_file.exists() {
        TriageConfig::load(&config_file)?
    } else {
        TriageConfig::default()
    };

    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        path = %config_file.display(),
        found = config_file.exists(),
        "Starting triage v{}",
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        Command::Chat(ref chat) => run_chat(DialogEngine::from_config(&config), chat)?,
        Command::Score { ref file } => run_score(file)?,
        Command::Serve { .. } => {
            let mut config = config;
            config.server.port = args.resolve_port(config.server.port);
            let engine = DialogEngine::from_config(&config);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_serve(config, engine))?;
        }
    }

    Ok(())
}

// =============================================================================
// serve
// =============================================================================

async fn run_serve(config: TriageConfig, engine: DialogEngine) -> Result<(), TriageError> {
    let api_token = auth::resolve_token(&config.server.api_token);
    let state = AppState::new(config, TriageOrchestrator::new(engine), api_token);
    triage_api::start_server(state).await
}

// =============================================================================
// chat
// =============================================================================

fn run_chat(engine: DialogEngine, args: &ChatArgs) -> Result<(), TriageError> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let privacy = args.agree || confirm(&mut lines, "개인정보 수집 및 이용에 동의하십니까? (y/n) ")?;
    let mut conv = match engine.start(args.profile(), args.consent(privacy)) {
        Ok(conv) => conv,
        Err(DialogError::ConsentRequired) => {
            println!("개인정보 수집에 동의해야 대화를 시작할 수 있습니다.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("(번호로 선택지를 고를 수 있습니다. /diagnose 진단 요청, /restart 다시 시작, /quit 종료)");
    print_last_assistant(&conv);

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();

        match input {
            "/quit" | "/exit" => break,
            "/restart" => {
                engine.restart(&mut conv);
                print_last_assistant(&conv);
                continue;
            }
            "/diagnose" => {
                match engine.request_diagnosis(&mut conv) {
                    Ok(_) => print_report(&engine, &conv)?,
                    Err(e) => println!("{}", e),
                }
                continue;
            }
            _ => {}
        }

        let text = resolve_choice(&conv, input);
        match engine.submit(&mut conv, &text) {
            Ok(Some(turn)) => {
                if turn.diagnosis.is_some() {
                    print_report(&engine, &conv)?;
                    continue;
                }
                println!("{}", turn.question);
                for (i, choice) in turn.choices.iter().enumerate() {
                    println!("  {}. {}", i + 1, choice);
                }
                if engine.can_request_diagnosis(&conv) {
                    println!("(/diagnose 로 진단을 요청할 수 있습니다)");
                }
            }
            Ok(None) => {}
            Err(DialogError::Finished) => {
                println!("진단이 완료되었습니다. /restart 로 다시 시작하세요.");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn confirm<B: BufRead>(lines: &mut io::Lines<B>, prompt: &str) -> Result<bool, TriageError> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let answer = match lines.next() {
        Some(line) => line?,
        None => return Ok(false),
    };
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "예" | "네"
    ))
}

/// Map a numbered quick reply onto its text; anything else passes through.
fn resolve_choice(conv: &Conversation, input: &str) -> String {
    let choice = conv.pending().and_then(|pending| {
        let n: usize = input.parse().ok()?;
        pending.choices.get(n.checked_sub(1)?).cloned()
    });
    choice.unwrap_or_else(|| input.to_string())
}

fn last_assistant(conv: &Conversation) -> Option<&str> {
    conv.transcript()
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.content.as_str())
}

fn print_last_assistant(conv: &Conversation) {
    if let Some(text) = last_assistant(conv) {
        println!("{}", text);
    }
}

/// Closing line from the transcript followed by the report body.
fn render_report(engine: &DialogEngine, conv: &Conversation) -> Result<String, TriageError> {
    let report = engine.report(conv, chrono::Local::now())?;
    Ok(match last_assistant(conv) {
        Some(closing) => format!("{}\n\n{}", closing, report),
        None => report.to_string(),
    })
}

fn print_report(engine: &DialogEngine, conv: &Conversation) -> Result<(), TriageError> {
    println!("{}", render_report(engine, conv)?);
    Ok(())
}

// =============================================================================
// score
// =============================================================================

/// A transcript file: a bare message array or an object wrapping one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Messages(Vec<Message>),
    Wrapped { transcript: Vec<Message> },
}

fn parse_transcript(content: &str) -> Result<Vec<Message>, TriageError> {
    let file: TranscriptFile = serde_json::from_str(content)?;
    Ok(match file {
        TranscriptFile::Messages(messages) => messages,
        TranscriptFile::Wrapped { transcript } => transcript,
    })
}

fn run_score(path: &Path) -> Result<(), TriageError> {
    let content = std::fs::read_to_string(path)?;
    let transcript = parse_transcript(&content)?;

    let assessment = TriageScorer::new().assess(&transcript);
    let summary = SummaryGenerator::new().summarize(&transcript);
    tracing::info!(
        messages = transcript.len(),
        score = assessment.score,
        triage_level = %assessment.level,
        "Transcript scored"
    );

    println!("위험 점수: {}", assessment.score);
    println!("분류: {} ({})", assessment.level.label(), assessment.level);
    println!("요약: {}", summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::config::DialogConfig;
    use triage_core::types::{Consent, PatientProfile};

    #[test]
    fn test_parse_transcript_both_shapes() {
        let bare = r#"[{"role": "user", "content": "숨이 차요"}]"#;
        assert_eq!(parse_transcript(bare).unwrap(), vec![Message::user("숨이 차요")]);

        let wrapped = r#"{"transcript": [{"role": "assistant", "content": "어디가 불편하세요?"}]}"#;
        assert_eq!(
            parse_transcript(wrapped).unwrap()[0].role,
            Role::Assistant
        );

        assert!(matches!(
            parse_transcript(r#"{"messages": []}"#),
            Err(TriageError::Serialization(_))
        ));
    }

    #[test]
    fn test_resolve_choice_by_number() {
        let engine = DialogEngine::new(DialogConfig::default());
        let consent = Consent {
            privacy: true,
            location: false,
        };
        let mut conv = engine.start(PatientProfile::default(), consent).unwrap();
        engine.submit(&mut conv, "숨이 차요").unwrap();

        let first = conv.pending().unwrap().choices[0].clone();
        assert_eq!(resolve_choice(&conv, "1"), first);
        assert_eq!(resolve_choice(&conv, "0"), "0");
        assert_eq!(resolve_choice(&conv, "9"), "9");
        assert_eq!(resolve_choice(&conv, "네"), "네");
    }

    #[test]
    fn test_report_does_not_repeat_closing_line() {
        let engine = DialogEngine::new(DialogConfig::default());
        let consent = Consent {
            privacy: true,
            location: false,
        };
        let mut conv = engine.start(PatientProfile::default(), consent).unwrap();
        let turn = engine
            .submit(&mut conv, "가슴 통증이 있고 숨이 차고 식은땀이 나요")
            .unwrap()
            .unwrap();
        assert!(turn.diagnosis.is_some());

        let rendered = render_report(&engine, &conv).unwrap();
        assert_eq!(rendered.matches("진단을 진행하겠습니다").count(), 1);
        assert!(rendered.starts_with("진단을 진행하겠습니다."));
        let title = engine.report(&conv, chrono::Local::now()).unwrap().title;
        assert!(rendered.contains(&title));
    }
}
