//! Dice command - rolls `NdM+K` specs, defaulting to one d6.

use async_trait::async_trait;
use dispatch_engine::{Command, CommandContext, CommandHandler, CommandSpec};
use rand::Rng;
use usage_resolver::UsageSpec;

const MAX_DICE: u64 = 100;
const MAX_SIDES: u64 = 1000;

pub struct DiceHandler;

#[async_trait]
impl CommandHandler for DiceHandler {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let spec = ctx
            .arg("spec")
            .and_then(|v| v.as_str())
            .unwrap_or("1d6")
            .to_string();

        let Some((count, sides, modifier)) = parse_spec(&spec) else {
            ctx.responder
                .say(&format!(
                    "\"{spec}\" is not a dice spec I understand. Try something like 2d6+3."
                ))
                .await?;
            return Ok(());
        };

        let rolls: Vec<u64> = {
            let mut rng = rand::thread_rng();
            (0..count).map(|_| rng.gen_range(1..=sides)).collect()
        };
        let total = rolls.iter().sum::<u64>() as i64 + modifier;

        let detail = rolls
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let text = if modifier != 0 {
            format!("{spec}: [{detail}] {modifier:+} = {total}")
        } else {
            format!("{spec}: [{detail}] = {total}")
        };
        ctx.responder.say(&text).await?;
        Ok(())
    }
}

/// Parse `NdM` / `NdM+K` / `NdM-K`. `N` may be omitted.
fn parse_spec(spec: &str) -> Option<(u64, u64, i64)> {
    let (dice, modifier) = match spec.split_once(['+', '-']) {
        Some((dice, tail)) => {
            let value: i64 = tail.parse().ok()?;
            let sign = if spec.contains('-') { -1 } else { 1 };
            (dice, sign * value)
        }
        None => (spec, 0),
    };

    let (count, sides) = dice.split_once(['d', 'D'])?;
    let count: u64 = if count.is_empty() { 1 } else { count.parse().ok()? };
    let sides: u64 = sides.parse().ok()?;

    if count == 0 || count > MAX_DICE || sides < 2 || sides > MAX_SIDES {
        return None;
    }
    Some((count, sides, modifier))
}

pub fn dice_command() -> Command {
    Command::new(
        CommandSpec::new("dice")
            .alias("roll")
            .description("Roll dice, e.g. !dice 2d6+3. Rolls 1d6 by default.")
            .arg(UsageSpec::string("spec").optional()),
        DiceHandler,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_spec("2d6"), Some((2, 6, 0)));
        assert_eq!(parse_spec("d20"), Some((1, 20, 0)));
    }

    #[test]
    fn test_parse_with_modifier() {
        assert_eq!(parse_spec("2d6+3"), Some((2, 6, 3)));
        assert_eq!(parse_spec("4d8-2"), Some((4, 8, -2)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_spec("banana"), None);
        assert_eq!(parse_spec("0d6"), None);
        assert_eq!(parse_spec("2d1"), None);
        assert_eq!(parse_spec("2d6+x"), None);
        assert_eq!(parse_spec("9999d6"), None);
    }
}
