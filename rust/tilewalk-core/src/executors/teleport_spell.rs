use super::{ExecContext, DEFAULT_WAIT_MS};
use crate::transport::{SubDestination, Transport};

/// Spell name (lowercased) and menu option, which defaults to `cast`.
pub fn spell_and_option(sub: &SubDestination) -> (String, String) {
    (sub.label.to_ascii_lowercase(), sub.option_or("cast").to_string())
}

pub(super) fn run(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let (spell, option) = spell_and_option(&t.sub_destination());
    if spell.is_empty() || !ctx.env.agent.cast_spell(&spell, &option) {
        return false;
    }
    ctx.wait_not_animating(DEFAULT_WAIT_MS);
    ctx.wait_within(t.destination, ctx.offset(), DEFAULT_WAIT_MS * 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(raw: &str) -> (String, String) {
        spell_and_option(&SubDestination::parse(raw))
    }

    #[test]
    fn option_defaults_to_cast() {
        assert_eq!(split("Varrock Teleport"), ("varrock teleport".into(), "cast".into()));
        assert_eq!(split("Varrock Teleport:"), ("varrock teleport".into(), "cast".into()));
        assert_eq!(split("Varrock Teleport: Grand Exchange"), ("varrock teleport".into(), "Grand Exchange".into()));
    }
}
