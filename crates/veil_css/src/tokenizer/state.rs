/// These are the states in which the tokenizer can be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Between rules: whitespace, at-rule heads and `@import`/`@charset` statements
    TopLevel,

    /// Quoted string inside an at-rule head or statement
    TopLevelInQuote,

    /// Collecting a selector group, or between rules inside an `@media` block
    Selector,

    /// Quoted string inside a selector
    SelectorInQuote,

    /// Inside a declaration block
    Declaration,

    /// Quoted string inside a declaration
    DeclarationInQuote,

    /// Inside a `/* ... */` comment
    Comment,
}

impl State {
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        matches!(
            self,
            State::TopLevelInQuote | State::SelectorInQuote | State::DeclarationInQuote
        )
    }

    /// The quote state belonging to this region
    #[must_use]
    pub fn quoted(&self) -> State {
        match self {
            State::TopLevel => State::TopLevelInQuote,
            State::Selector => State::SelectorInQuote,
            State::Declaration => State::DeclarationInQuote,
            other => *other,
        }
    }

    /// The region a quote state belongs to
    #[must_use]
    pub fn unquoted(&self) -> State {
        match self {
            State::TopLevelInQuote => State::TopLevel,
            State::SelectorInQuote => State::Selector,
            State::DeclarationInQuote => State::Declaration,
            other => *other,
        }
    }
}
