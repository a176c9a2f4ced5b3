//! Console presenter: the interactive text dialogue with the peer.

use crate::table::render_probability_table;
use fair_dice_core::{
    protocol::{CombinationPolicy, CombinedResult, DrawPurpose, Resolution, Reveal, ValueRange},
    DiceSet, Die, Mac, PeerInput, PeerPrompt, Presenter, ProtocolError, Side, Verdict,
};
use std::fmt;
use std::io::{self, BufRead, Write};

/// Longest range whose values are listed one per line in a menu
const MAX_LISTED_OPTIONS: i64 = 20;

enum Answer {
    Number(i64),
    Exit,
    Help,
    Invalid,
}

/// Presenter that reads answers from `input` and writes the dialogue to `output`
pub struct ConsolePresenter<R, W> {
    input: R,
    output: W,
    dice: DiceSet,
    /// First write failure, surfaced at the next read
    write_error: Option<io::Error>,
}

impl<R: BufRead, W: Write> ConsolePresenter<R, W> {
    pub fn new(input: R, output: W, dice: DiceSet) -> Self {
        Self {
            input,
            output,
            dice,
            write_error: None,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, args: fmt::Arguments<'_>) {
        if self.write_error.is_some() {
            return;
        }
        if let Err(e) = self.output.write_fmt(args).and_then(|_| self.output.write_all(b"\n")) {
            self.write_error = Some(e);
        }
    }

    fn read_answer(&mut self) -> Result<Answer, ProtocolError> {
        if let Some(e) = self.write_error.take() {
            return Err(e.into());
        }
        write!(self.output, "Your selection: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            // End of input means the peer is gone.
            return Ok(Answer::Exit);
        }
        let answer = line.trim();
        Ok(if answer.eq_ignore_ascii_case("x") {
            Answer::Exit
        } else if answer == "?" {
            Answer::Help
        } else {
            answer.parse().map(Answer::Number).unwrap_or(Answer::Invalid)
        })
    }

    fn show_help(&mut self) {
        let table = render_probability_table(&self.dice);
        self.say(format_args!("Probability of the win for the row die:"));
        self.say(format_args!("{}", table));
    }

    fn show_options(&mut self, min: i64, max: i64) {
        if (max as i128 - min as i128) < MAX_LISTED_OPTIONS as i128 {
            for value in min..=max {
                self.say(format_args!("{value} - {value}"));
            }
        } else {
            self.say(format_args!("{min}..{max} - any number in this range"));
        }
        self.say(format_args!("X - exit"));
        self.say(format_args!("? - help"));
    }
}

impl<R: BufRead, W: Write> Presenter for ConsolePresenter<R, W> {
    fn display_commitment(&mut self, purpose: DrawPurpose, range: ValueRange, mac: &Mac) {
        if purpose == DrawPurpose::FirstMove {
            self.say(format_args!("Let's determine who makes the first move."));
        }
        self.say(format_args!(
            "I selected a random value in the range {}..{} (HMAC={}).",
            range.min(),
            range.max(),
            mac
        ));
    }

    fn request_peer_integer(
        &mut self,
        prompt: &PeerPrompt,
    ) -> Result<PeerInput<i64>, ProtocolError> {
        match prompt.policy {
            CombinationPolicy::Guess => self.say(format_args!("Try to guess my selection.")),
            CombinationPolicy::Additive => self.say(format_args!(
                "Add your number modulo {}.",
                prompt.range.span()
            )),
        }
        self.show_options(prompt.min, prompt.max);

        loop {
            match self.read_answer()? {
                Answer::Number(n) => return Ok(PeerInput::Value(n)),
                Answer::Exit => return Ok(PeerInput::Exit),
                Answer::Help => self.show_help(),
                Answer::Invalid => self.say(format_args!(
                    "Invalid input. Enter a number from {} to {}.",
                    prompt.min, prompt.max
                )),
            }
        }
    }

    fn display_rejected_input(&mut self, error: &ProtocolError) {
        self.say(format_args!("{error}. Try again."));
    }

    fn display_reveal(&mut self, purpose: DrawPurpose, reveal: &Reveal, combined: &CombinedResult) {
        match combined.resolution {
            Resolution::Guess { .. } => self.say(format_args!(
                "My selection: {} (KEY={}).",
                reveal.committed_value, reveal.key
            )),
            Resolution::Sum { final_value } => {
                self.say(format_args!(
                    "My number is {} (KEY={}).",
                    reveal.committed_value, reveal.key
                ));
                self.say(format_args!(
                    "The {} result is {} + {} = {} (mod {}).",
                    purpose,
                    reveal.committed_value,
                    combined.contribution,
                    final_value,
                    combined.range.span()
                ));
            }
        }
    }

    fn select_die(
        &mut self,
        side: Side,
        dice: &DiceSet,
        excluded: Option<usize>,
    ) -> Result<PeerInput<usize>, ProtocolError> {
        match side {
            Side::Peer => self.say(format_args!("Choose your dice:")),
            Side::System => self.say(format_args!("Choose my dice:")),
        }
        for (index, die) in dice.iter().enumerate() {
            if Some(index) != excluded {
                self.say(format_args!("{index} - {die}"));
            }
        }
        self.say(format_args!("X - exit"));
        self.say(format_args!("? - help"));

        loop {
            match self.read_answer()? {
                Answer::Number(n) => match usize::try_from(n) {
                    Ok(index) => return Ok(PeerInput::Value(index)),
                    Err(_) => self.say(format_args!("Invalid input. Try again.")),
                },
                Answer::Exit => return Ok(PeerInput::Exit),
                Answer::Help => self.show_help(),
                Answer::Invalid => self.say(format_args!("Invalid input. Try again.")),
            }
        }
    }

    fn display_round_outcome(&mut self, system_value: i64, peer_value: i64, verdict: Verdict) {
        match verdict {
            Verdict::PeerWins => self.say(format_args!("You win ({peer_value} > {system_value})!")),
            Verdict::SystemWins => self.say(format_args!("I win ({system_value} > {peer_value})!")),
            Verdict::Tie => self.say(format_args!("It's a tie ({system_value} = {peer_value}).")),
        }
    }

    fn display_first_move(&mut self, first: Side) {
        match first {
            Side::Peer => self.say(format_args!("You guessed it. You make the first move.")),
            Side::System => self.say(format_args!("I make the first move.")),
        }
    }

    fn display_die_choice(&mut self, side: Side, _index: usize, die: &Die) {
        match side {
            Side::System => self.say(format_args!("I choose the {die} dice.")),
            Side::Peer => self.say(format_args!("You choose the {die} dice.")),
        }
    }

    fn display_roll(&mut self, side: Side, value: i64) {
        match side {
            Side::System => self.say(format_args!("My roll is {value}.")),
            Side::Peer => self.say(format_args!("Your roll is {value}.")),
        }
    }
}
