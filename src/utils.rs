use bitflags::bitflags;

bitflags! {
    pub struct AutomatonFlags: u32 {
        const NO_FLAG = 0;
        /// Stop reading a DFA input at an `'e'` outside the alphabet and decide
        /// by the finality of the current state.
        const EPSILON_SHORTCUT = 1 << 1;
        /// Mark converted DFA states final when the name of an NFA final state
        /// occurs in the canonical subset name.
        const SUBSTRING_FINALITY = 1 << 2;
    }
}

impl Default for AutomatonFlags {
    fn default() -> Self {
        AutomatonFlags::EPSILON_SHORTCUT
    }
}
