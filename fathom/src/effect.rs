#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    LoadLevel { index: u32 },
}
