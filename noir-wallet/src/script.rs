//! Script bytes and the handful of templates the wallet recognizes

use std::fmt;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// A single parsed script element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Data push (including the empty push of `OP_0`)
    Push(&'a [u8]),
    /// Any other opcode
    Op(u8),
}

/// Iterator over script elements. Stops at the first truncated push, leaving it unconsumed.
pub struct Instructions<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Instruction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&op, rest) = self.data.split_first()?;
        let (len, rest) = match op {
            OP_0 => (0, rest),
            0x01..=0x4b => (op as usize, rest),
            OP_PUSHDATA1 => {
                let (&n, rest) = rest.split_first()?;
                (n as usize, rest)
            }
            OP_PUSHDATA2 => {
                if rest.len() < 2 {
                    return None;
                }
                (u16::from_le_bytes([rest[0], rest[1]]) as usize, &rest[2..])
            }
            OP_PUSHDATA4 => {
                if rest.len() < 4 {
                    return None;
                }
                (u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize, &rest[4..])
            }
            _ => {
                self.data = rest;
                return Some(Instruction::Op(op));
            }
        };
        if rest.len() < len {
            return None;
        }
        self.data = &rest[len..];
        Some(Instruction::Push(&rest[..len]))
    }
}

/// Owned script bytes
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new() -> Self {
        Script(Vec::new())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn new_p2pkh(hash: &[u8; 20]) -> Self {
        let mut script = Vec::with_capacity(25);
        script.push(OP_DUP);
        script.push(OP_HASH160);
        script.push(20);
        script.extend_from_slice(hash);
        script.push(OP_EQUALVERIFY);
        script.push(OP_CHECKSIG);
        Script(script)
    }

    /// `OP_HASH160 <20> OP_EQUAL`
    pub fn new_p2sh(hash: &[u8; 20]) -> Self {
        let mut script = Vec::with_capacity(23);
        script.push(OP_HASH160);
        script.push(20);
        script.extend_from_slice(hash);
        script.push(OP_EQUAL);
        Script(script)
    }

    /// `OP_RETURN <data>`
    pub fn new_op_return(data: &[u8]) -> Self {
        let mut script = vec![OP_RETURN];
        push_slice(&mut script, data);
        Script(script)
    }

    /// Script made of data pushes only, as found in a script-sig
    pub fn from_pushes(pushes: &[&[u8]]) -> Self {
        let mut script = Vec::new();
        for data in pushes {
            push_slice(&mut script, data);
        }
        Script(script)
    }

    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            data: &self.0,
        }
    }

    pub fn is_p2pkh(&self) -> bool {
        self.0.len() == 25
            && self.0[0] == OP_DUP
            && self.0[1] == OP_HASH160
            && self.0[2] == 20
            && self.0[23] == OP_EQUALVERIFY
            && self.0[24] == OP_CHECKSIG
    }

    pub fn is_p2sh(&self) -> bool {
        self.0.len() == 23 && self.0[0] == OP_HASH160 && self.0[1] == 20 && self.0[22] == OP_EQUAL
    }

    pub fn is_op_return(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// Key hash of a P2PKH script
    pub fn p2pkh_hash(&self) -> Option<[u8; 20]> {
        if !self.is_p2pkh() {
            return None;
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&self.0[3..23]);
        Some(hash)
    }

    /// Script hash of a P2SH script
    pub fn p2sh_hash(&self) -> Option<[u8; 20]> {
        if !self.is_p2sh() {
            return None;
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&self.0[2..22]);
        Some(hash)
    }

    /// All elements as data pushes, or `None` if the script contains an opcode or is truncated
    pub fn push_elements(&self) -> Option<Vec<&[u8]>> {
        let mut pushes = Vec::new();
        let mut instructions = self.instructions();
        for instruction in instructions.by_ref() {
            match instruction {
                Instruction::Push(data) => pushes.push(data),
                Instruction::Op(_) => return None,
            }
        }
        instructions.data.is_empty().then_some(pushes)
    }
}

/// Append a minimal data push
fn push_slice(script: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0 => script.push(OP_0),
        n @ 1..=0x4b => script.push(n as u8),
        n @ 0x4c..=0xff => {
            script.push(OP_PUSHDATA1);
            script.push(n as u8);
        }
        n @ 0x100..=0xffff => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(n as u16).to_le_bytes());
        }
        n => {
            script.push(OP_PUSHDATA4);
            script.extend_from_slice(&(n as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}
