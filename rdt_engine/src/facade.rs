//! Side-effect records and the collaborator that receives them.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub dir: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Door {
    pub id: u8,
    pub x: i16,
    pub y: i16,
    pub w: i16,
    pub h: i16,
    pub next_stage: u8,
    pub next_room: u8,
    pub next_camera: u8,
    pub next_pos: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: u8,
    pub x: i16,
    pub y: i16,
    pub w: i16,
    pub h: i16,
    pub kind: u16,
    pub amount: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagOpKind {
    Clear,
    Set,
    Toggle,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagOp {
    pub array: u8,
    pub bit: u8,
    pub op: FlagOpKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
    Ne,
}

impl Compare {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Compare::Eq),
            1 => Some(Compare::Gt),
            2 => Some(Compare::Ge),
            3 => Some(Compare::Lt),
            4 => Some(Compare::Le),
            5 => Some(Compare::Ne),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Compare::Eq => "EQ",
            Compare::Gt => "GT",
            Compare::Ge => "GE",
            Compare::Lt => "LT",
            Compare::Le => "LE",
            Compare::Ne => "NE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarOpKind {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Or,
    And,
    Xor,
    Not,
    Shr,
    Shl,
    Sar,
    Compare(Compare),
}

impl VarOpKind {
    /// Arithmetic operator codes shared by the calc opcodes of RE2 and RE3.
    pub fn from_calc_code(code: u8) -> Option<Self> {
        const OPS: [VarOpKind; 12] = [
            VarOpKind::Add,
            VarOpKind::Sub,
            VarOpKind::Mul,
            VarOpKind::Div,
            VarOpKind::Mod,
            VarOpKind::Or,
            VarOpKind::And,
            VarOpKind::Xor,
            VarOpKind::Not,
            VarOpKind::Shr,
            VarOpKind::Shl,
            VarOpKind::Sar,
        ];
        OPS.get(usize::from(code)).copied()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            VarOpKind::Set => "=",
            VarOpKind::Add => "+=",
            VarOpKind::Sub => "-=",
            VarOpKind::Mul => "*=",
            VarOpKind::Div => "/=",
            VarOpKind::Mod => "%=",
            VarOpKind::Or => "|=",
            VarOpKind::And => "&=",
            VarOpKind::Xor => "^=",
            VarOpKind::Not => "= !",
            VarOpKind::Shr => ">>=",
            VarOpKind::Shl => "<<=",
            VarOpKind::Sar => ">>=",
            VarOpKind::Compare(compare) => compare.mnemonic(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Operand {
    Immediate(i16),
    Var(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VarOp {
    pub id: u8,
    pub op: VarOpKind,
    pub operand: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CameraSwitch {
    pub id: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: u8,
}

/// Receiver of everything a script execution changes.
pub trait GameFacade {
    fn add_door(&mut self, door: Door);
    fn add_item(&mut self, item: Item);
    fn set_flag(&mut self, op: FlagOp);
    fn set_var(&mut self, op: VarOp);
    fn switch_camera(&mut self, camera: CameraSwitch);

    fn show_message(&mut self, _message: Message) {}

    /// Stage the current room belongs to; relative door targets resolve against it.
    fn current_stage(&self) -> u8;

    fn test_flag(&self, array: u8, bit: u8) -> bool;
}

/// In-memory facade.
///
/// Doors, items, messages and the operation logs belong to the current room
/// and are cleared by [`RoomState::enter_room`]. Flags and variables persist
/// across rooms.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RoomState {
    pub stage: u8,
    pub room: u8,
    pub camera: u8,
    pub doors: Vec<Door>,
    pub items: Vec<Item>,
    pub messages: Vec<Message>,
    pub flag_ops: Vec<FlagOp>,
    pub var_ops: Vec<VarOp>,
    flags: BTreeMap<u8, BTreeSet<u8>>,
    vars: BTreeMap<u8, i16>,
}

impl RoomState {
    pub fn new(stage: u8, room: u8) -> Self {
        RoomState {
            stage,
            room,
            ..RoomState::default()
        }
    }

    pub fn enter_room(&mut self, stage: u8, room: u8) {
        self.stage = stage;
        self.room = room;
        self.camera = 0;
        self.doors.clear();
        self.items.clear();
        self.messages.clear();
        self.flag_ops.clear();
        self.var_ops.clear();
    }

    pub fn flag(&self, array: u8, bit: u8) -> bool {
        self.flags
            .get(&array)
            .is_some_and(|bits| bits.contains(&bit))
    }

    pub fn var(&self, id: u8) -> i16 {
        self.vars.get(&id).copied().unwrap_or(0)
    }

    fn write_flag(&mut self, array: u8, bit: u8, value: bool) {
        let bits = self.flags.entry(array).or_default();
        if value {
            bits.insert(bit);
        } else {
            bits.remove(&bit);
        }
    }
}

impl GameFacade for RoomState {
    fn add_door(&mut self, door: Door) {
        self.doors.push(door);
    }

    fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    fn set_flag(&mut self, op: FlagOp) {
        match op.op {
            FlagOpKind::Clear => self.write_flag(op.array, op.bit, false),
            FlagOpKind::Set => self.write_flag(op.array, op.bit, true),
            FlagOpKind::Toggle => {
                let current = self.flag(op.array, op.bit);
                self.write_flag(op.array, op.bit, !current);
            }
            FlagOpKind::Test => {}
        }
        self.flag_ops.push(op);
    }

    fn set_var(&mut self, op: VarOp) {
        let operand = match op.operand {
            Operand::Immediate(value) => value,
            Operand::Var(id) => self.var(id),
        };
        let current = self.var(op.id);
        let updated = match op.op {
            VarOpKind::Set => Some(operand),
            VarOpKind::Add => Some(current.wrapping_add(operand)),
            VarOpKind::Sub => Some(current.wrapping_sub(operand)),
            VarOpKind::Mul => Some(current.wrapping_mul(operand)),
            VarOpKind::Div => current.checked_div(operand),
            VarOpKind::Mod => current.checked_rem(operand),
            VarOpKind::Or => Some(current | operand),
            VarOpKind::And => Some(current & operand),
            VarOpKind::Xor => Some(current ^ operand),
            VarOpKind::Not => Some(i16::from(current == 0)),
            VarOpKind::Shr => Some(((current as u16) >> (operand & 15)) as i16),
            VarOpKind::Shl => Some(current.wrapping_shl(operand as u32 & 15)),
            VarOpKind::Sar => Some(current >> (operand & 15)),
            VarOpKind::Compare(_) => None,
        };
        if let Some(value) = updated {
            self.vars.insert(op.id, value);
        }
        self.var_ops.push(op);
    }

    fn switch_camera(&mut self, camera: CameraSwitch) {
        self.camera = camera.id;
    }

    fn show_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn current_stage(&self) -> u8 {
        self.stage
    }

    fn test_flag(&self, array: u8, bit: u8) -> bool {
        self.flag(array, bit)
    }
}
