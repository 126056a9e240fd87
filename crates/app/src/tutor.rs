//! Terminal front end for one practice session.

use std::fmt;

use pecs_core::model::{Catalog, ImageId, PhraseElement, render_phrase};
use services::exercise::{Prompt, Round};
use services::{Answer, PracticeOutcome, PracticeService, PracticeSession, PracticeTick};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, stdin, stdout};

#[derive(Debug, PartialEq, Eq)]
pub enum InputError {
    Empty,
    UnknownToken(String),
    OutOfRange { token: String, len: usize },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "nothing entered"),
            InputError::UnknownToken(token) => write!(f, "not a card: {token}"),
            InputError::OutOfRange { token, len } => {
                write!(f, "{token} is not on offer (choose 1-{len})")
            }
        }
    }
}

impl std::error::Error for InputError {}

/// What the learner typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Quit,
    Answer(Answer),
}

/// Parses a line typed during a round.
///
/// Picture phases take a single picture number. Sentence phases take a
/// sequence of cards: `s<n>` for a starter, `c<n>` for a connector and a bare
/// number for a picture.
pub fn parse_input(line: &str, round: &Round, expects_image: bool) -> Result<Input, InputError> {
    let line = line.trim();
    if matches!(line, "q" | "quit" | "exit") {
        return Ok(Input::Quit);
    }

    let mut elements = Vec::new();
    for token in line.split_whitespace() {
        elements.push(parse_token(token, round)?);
    }

    if expects_image {
        return match elements.as_slice() {
            [PhraseElement::Image(id)] => Ok(Input::Answer(Answer::Image(id.clone()))),
            [] => Err(InputError::Empty),
            _ => Err(InputError::UnknownToken(line.to_string())),
        };
    }

    if elements.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(Input::Answer(Answer::Phrase(elements)))
}

fn parse_token(token: &str, round: &Round) -> Result<PhraseElement, InputError> {
    let lowered = token.to_ascii_lowercase();
    let (cards, digits): (Option<&[_]>, &str) = match lowered.chars().next() {
        Some('s') => (Some(round.starters.as_slice()), &lowered[1..]),
        Some('c') => (Some(round.connectors.as_slice()), &lowered[1..]),
        _ => (None, lowered.as_str()),
    };

    let index: usize = digits
        .parse()
        .map_err(|_| InputError::UnknownToken(token.to_string()))?;

    match cards {
        Some(words) => pick(words, index, token).map(|w| PhraseElement::Text(w.text.clone())),
        None => pick(&round.choices, index, token).map(|id| PhraseElement::Image(id.clone())),
    }
}

fn pick<'a, T>(items: &'a [T], index: usize, token: &str) -> Result<&'a T, InputError> {
    index
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .ok_or_else(|| InputError::OutOfRange {
            token: token.to_string(),
            len: items.len(),
        })
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn picture(catalog: &Catalog, id: &ImageId) -> String {
    catalog
        .image(id)
        .map_or_else(|| id.to_string(), |img| format!("{} {}", img.symbol, img.name))
}

/// Text shown for a round.
#[must_use]
pub fn render_round(round: &Round, catalog: &Catalog) -> String {
    let mut out = String::new();
    let heading = match &round.prompt {
        Prompt::Exchange { target } => format!("Give your partner: {}", picture(catalog, target)),
        Prompt::Select { target } => format!("Find: {}", picture(catalog, target)),
        Prompt::Request { expected, .. } => format!("Build the request: \"{expected}\""),
        Prompt::Question { kind, target, .. } => {
            format!("{} (look at {})", kind.text(), picture(catalog, target))
        }
        Prompt::Comment {
            function,
            scenario,
            context,
        } => {
            let scene: Vec<String> = context.iter().map(|id| picture(catalog, id)).collect();
            format!(
                "{} - {}\n  {}\n  Scene: {}",
                function.name,
                scenario,
                function.prompt,
                scene.join(", ")
            )
        }
    };
    out.push_str(&format!("\nRound {}: {heading}\n", round.number));

    for (i, id) in round.choices.iter().enumerate() {
        out.push_str(&format!("  {:>2}  {}\n", i + 1, picture(catalog, id)));
    }
    for (i, word) in round.starters.iter().enumerate() {
        out.push_str(&format!("  s{:<2} {} {}\n", i + 1, word.symbol, word.text));
    }
    for (i, word) in round.connectors.iter().enumerate() {
        out.push_str(&format!("  c{:<2} {} {}\n", i + 1, word.symbol, word.text));
    }
    out
}

//
// ─── SESSION LOOP ──────────────────────────────────────────────────────────────
//

async fn say(text: &str) -> std::io::Result<()> {
    let mut out = stdout();
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> std::io::Result<Option<String>> {
    say("> ").await?;
    lines.next_line().await
}

/// Runs practice until mastery, `q`, or end of input.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or written, or the
/// session cannot be completed.
pub async fn run(
    service: &PracticeService,
    mut practice: PracticeSession,
) -> Result<PracticeOutcome, Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(stdin()).lines();
    let expects_image = practice.engine().config().expects_image();
    let hint = if expects_image {
        "Type a picture number, or q to stop."
    } else {
        "Type cards in order, e.g. `s1 3`, or q to stop."
    };
    say(&format!("{hint}\n")).await?;

    loop {
        let catalog = practice.engine().catalog();
        say(&render_round(practice.engine().round(), catalog)).await?;

        let input = loop {
            let Some(line) = read_line(&mut lines).await? else {
                break Input::Quit;
            };
            match parse_input(&line, practice.engine().round(), expects_image) {
                Ok(input) => break input,
                Err(err) => say(&format!("{err}\n")).await?,
            }
        };

        let answer = match input {
            Input::Quit => return Ok(service.finish(&mut practice).await?),
            Input::Answer(answer) => answer,
        };

        let feedback = service.submit(&mut practice, &answer)?;
        let spoken = match &answer {
            Answer::Phrase(elements) => {
                format!(" \"{}\"", render_phrase(elements, practice.engine().catalog()))
            }
            Answer::Image(_) => String::new(),
        };
        let verdict = if feedback.correct {
            "Well done!"
        } else {
            "Not quite, try again."
        };
        say(&format!(
            "{verdict}{spoken}  score {}/{} ({} attempts)\n",
            feedback.score,
            practice.engine().config().mastery_threshold,
            feedback.attempts
        ))
        .await?;

        let mut ticket = feedback.ticket;
        loop {
            tokio::time::sleep(ticket.delay).await;
            match service.tick(&mut practice, ticket).await? {
                PracticeTick::Waiting(next) => ticket = next,
                PracticeTick::NextRound => break,
                PracticeTick::Completed(outcome) => return Ok(outcome),
                PracticeTick::Stale => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pecs_core::model::{PhaseId, PracticeSettings};
    use pecs_core::time::fixed_now;
    use services::exercise::{ExerciseConfig, ExerciseEngine};
    use std::sync::Arc;

    fn round(phase: u8) -> Round {
        let config =
            ExerciseConfig::for_phase(PhaseId::new(phase).unwrap(), &PracticeSettings::default());
        ExerciseEngine::with_seed(config, Arc::new(Catalog::builtin()), 3, fixed_now())
            .unwrap()
            .round()
            .clone()
    }

    #[test]
    fn picture_number_selects_choice() {
        let round = round(1);
        assert_eq!(
            parse_input(" 2 ", &round, true),
            Ok(Input::Answer(Answer::Image(round.choices[1].clone())))
        );
        assert_eq!(parse_input("q", &round, true), Ok(Input::Quit));
        assert_eq!(parse_input("", &round, true), Err(InputError::Empty));
        assert!(matches!(
            parse_input("0", &round, true),
            Err(InputError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_input("1 2", &round, true),
            Err(InputError::UnknownToken(_))
        ));
    }

    #[test]
    fn sentence_tokens_build_a_phrase() {
        let round = round(4);
        let parsed = parse_input("S1 c1 3", &round, false).unwrap();
        assert_eq!(
            parsed,
            Input::Answer(Answer::Phrase(vec![
                PhraseElement::Text(round.starters[0].text.clone()),
                PhraseElement::Text(round.connectors[0].text.clone()),
                PhraseElement::Image(round.choices[2].clone()),
            ]))
        );
        assert!(matches!(
            parse_input("x1", &round, false),
            Err(InputError::UnknownToken(_))
        ));
        assert!(matches!(
            parse_input("s99", &round, false),
            Err(InputError::OutOfRange { .. })
        ));
    }

    #[test]
    fn rendered_round_lists_every_card() {
        let catalog = Catalog::builtin();
        let round = round(6);
        let text = render_round(&round, &catalog);
        assert!(text.contains("Round 1"));
        assert!(text.contains("Scene:"));
        assert!(text.contains(&format!("s{:<2}", round.starters.len())));
        assert!(text.contains("12  "));
    }
}
