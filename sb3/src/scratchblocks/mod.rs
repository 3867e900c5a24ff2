//! Canonical textual rendering of scripts in scratchblocks notation.
//!
//! The rendered text is both the human-readable code excerpt embedded in
//! diagnostics and the haystack for the text-level predicates of the rule
//! layers, so the notation must be stable and every interpolated name must
//! be escaped so it cannot be confused with notation syntax.

use std::collections::HashSet;

use crate::opcodes;
use crate::raw::{Blocks, Input, Literal, RawBlock};

/// Backslash-escape the notation control characters in `text`.
///
/// Closing brackets (`)`, `]`, `>`) are always escaped; opening ones only
/// with `all_brackets`. Newlines collapse to spaces. The function is pure
/// and repeatable: names that are re-embedded inside an already-escaped
/// line (custom-operation signatures, for one) are escaped once more per
/// embedding depth.
pub fn escape(text: &str, all_brackets: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            ')' | ']' | '>' => {
                out.push('\\');
                out.push(ch);
            }
            '(' | '[' | '<' if all_brackets => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

/// A rendered script: its canonical text plus the stack blocks it covers
/// in source order (nested sub-stack bodies included, reporters not).
#[derive(Debug, Clone)]
pub struct Rendered {
    pub text: String,
    pub block_ids: Vec<String>,
}

/// Render the script rooted at `root`. Cycle-guarded: malformed `next`
/// or sub-stack links terminate instead of recursing forever.
pub fn render_script(blocks: &Blocks, root: &str) -> Rendered {
    let mut renderer = Renderer {
        blocks,
        lines: Vec::new(),
        block_ids: Vec::new(),
        visited: HashSet::new(),
    };
    renderer.chain(Some(root));
    Rendered {
        text: renderer.lines.join("\n"),
        block_ids: renderer.block_ids,
    }
}

/// Convenience for diagnostics that only need the text.
pub fn script_text(blocks: &Blocks, root: &str) -> String {
    render_script(blocks, root).text
}

/// Render a single reporter (expression) block, bracket-wrapped. Used by
/// diagnostics that excerpt one expression out of a script.
pub fn reporter_text(blocks: &Blocks, id: &str) -> String {
    let mut renderer = Renderer {
        blocks,
        lines: Vec::new(),
        block_ids: Vec::new(),
        visited: HashSet::new(),
    };
    renderer.reporter(id)
}

struct Renderer<'a> {
    blocks: &'a Blocks,
    lines: Vec<String>,
    block_ids: Vec<String>,
    visited: HashSet<String>,
}

impl<'a> Renderer<'a> {
    fn chain(&mut self, start: Option<&str>) {
        let mut current = start.map(str::to_string);
        while let Some(id) = current {
            if !self.visited.insert(id.clone()) {
                break;
            }
            let Some(block) = self.blocks.get(&id) else {
                break;
            };
            self.stack_block(&id, block);
            current = block.next.clone();
        }
    }

    fn stack_block(&mut self, id: &str, block: &RawBlock) {
        self.block_ids.push(id.to_string());
        match block.opcode.as_str() {
            "control_forever" => {
                self.lines.push("forever".into());
                self.body(block, "SUBSTACK");
                self.lines.push("end".into());
            }
            "control_repeat" => {
                let times = self.num_input(block, "TIMES");
                self.lines.push(format!("repeat {}", times));
                self.body(block, "SUBSTACK");
                self.lines.push("end".into());
            }
            "control_repeat_until" => {
                let cond = self.bool_input(block, "CONDITION");
                self.lines.push(format!("repeat until {}", cond));
                self.body(block, "SUBSTACK");
                self.lines.push("end".into());
            }
            "control_if" => {
                let cond = self.bool_input(block, "CONDITION");
                self.lines.push(format!("if {} then", cond));
                self.body(block, "SUBSTACK");
                self.lines.push("end".into());
            }
            "control_if_else" => {
                let cond = self.bool_input(block, "CONDITION");
                self.lines.push(format!("if {} then", cond));
                self.body(block, "SUBSTACK");
                self.lines.push("else".into());
                self.body(block, "SUBSTACK2");
                self.lines.push("end".into());
            }
            _ => {
                let line = self.plain_line(block);
                self.lines.push(line);
            }
        }
    }

    fn body(&mut self, block: &RawBlock, slot: &str) {
        if let Some(id) = block.input(slot).and_then(Input::block_id) {
            let id = id.to_string();
            self.chain(Some(&id));
        }
    }

    /// Single-line stack blocks.
    fn plain_line(&mut self, block: &RawBlock) -> String {
        match block.opcode.as_str() {
            // events
            "event_whenflagclicked" => "when @greenFlag clicked".into(),
            "event_whenthisspriteclicked" => "when this sprite clicked".into(),
            "event_whenstageclicked" => "when stage clicked::event".into(),
            "event_whenkeypressed" => {
                format!("when {} key pressed::event", field_menu(block, "KEY_OPTION"))
            }
            "event_whenbackdropswitchesto" => {
                format!("when backdrop switches to {}", field_menu(block, "BACKDROP"))
            }
            "event_whengreaterthan" => {
                let sensor = block
                    .field("WHENGREATERTHANMENU")
                    .unwrap_or_default()
                    .to_lowercase();
                format!(
                    "when [{} v] \\> {}",
                    escape(&sensor, false),
                    self.num_input(block, "VALUE")
                )
            }
            "event_whenbroadcastreceived" => {
                format!("when I receive {}", field_menu(block, "BROADCAST_OPTION"))
            }
            "event_broadcast" => {
                format!("broadcast {}", self.broadcast_input(block))
            }
            "event_broadcastandwait" => {
                format!("broadcast {} and wait", self.broadcast_input(block))
            }

            // control
            "control_wait" => format!("wait {} seconds", self.num_input(block, "DURATION")),
            "control_wait_until" => {
                format!("wait until {}", self.bool_input(block, "CONDITION"))
            }
            "control_stop" => format!("stop {}", field_menu(block, "STOP_OPTION")),
            "control_start_as_clone" => "when I start as a clone".into(),
            "control_create_clone_of" => {
                format!("create clone of {}", self.menu_input(block, "CLONE_OPTION"))
            }
            "control_delete_this_clone" => "delete this clone".into(),

            // variables and lists
            "data_setvariableto" => format!(
                "set {} to {}",
                field_menu(block, "VARIABLE"),
                self.text_input(block, "VALUE")
            ),
            "data_changevariableby" => format!(
                "change {} by {}",
                field_menu(block, "VARIABLE"),
                self.num_input(block, "VALUE")
            ),
            "data_showvariable" => format!("show variable {}", field_menu(block, "VARIABLE")),
            "data_hidevariable" => format!("hide variable {}", field_menu(block, "VARIABLE")),
            "data_addtolist" => format!(
                "add {} to {}",
                self.text_input(block, "ITEM"),
                field_menu(block, "LIST")
            ),
            "data_deleteoflist" => format!(
                "delete {} of {}",
                self.num_input(block, "INDEX"),
                field_menu(block, "LIST")
            ),
            "data_deletealloflist" => {
                format!("delete all of {}", field_menu(block, "LIST"))
            }
            "data_insertatlist" => format!(
                "insert {} at {} of {}",
                self.text_input(block, "ITEM"),
                self.num_input(block, "INDEX"),
                field_menu(block, "LIST")
            ),
            "data_replaceitemoflist" => format!(
                "replace item {} of {} with {}",
                self.num_input(block, "INDEX"),
                field_menu(block, "LIST"),
                self.text_input(block, "ITEM")
            ),
            "data_showlist" => format!("show list {}", field_menu(block, "LIST")),
            "data_hidelist" => format!("hide list {}", field_menu(block, "LIST")),

            // sensing
            "sensing_askandwait" => {
                format!("ask {} and wait", self.text_input(block, "QUESTION"))
            }
            "sensing_resettimer" => "reset timer".into(),
            "sensing_setdragmode" => {
                format!("set drag mode {}::sensing", field_menu(block, "DRAG_MODE"))
            }

            // motion
            "motion_movesteps" => format!("move {} steps", self.num_input(block, "STEPS")),
            "motion_turnright" => {
                format!("turn cw {} degrees", self.num_input(block, "DEGREES"))
            }
            "motion_turnleft" => {
                format!("turn ccw {} degrees", self.num_input(block, "DEGREES"))
            }
            "motion_goto" => format!("go to {}", self.menu_input(block, "TO")),
            "motion_gotoxy" => format!(
                "go to x: {} y: {}",
                self.num_input(block, "X"),
                self.num_input(block, "Y")
            ),
            "motion_glideto" => format!(
                "glide {} secs to {}",
                self.num_input(block, "SECS"),
                self.menu_input(block, "TO")
            ),
            "motion_glidesecstoxy" => format!(
                "glide {} secs to x: {} y: {}",
                self.num_input(block, "SECS"),
                self.num_input(block, "X"),
                self.num_input(block, "Y")
            ),
            "motion_pointindirection" => {
                format!("point in direction {}", self.num_input(block, "DIRECTION"))
            }
            "motion_pointtowards" => {
                format!("point towards {}", self.menu_input(block, "TOWARDS"))
            }
            "motion_changexby" => format!("change x by {}", self.num_input(block, "DX")),
            "motion_setx" => format!("set x to {}", self.num_input(block, "X")),
            "motion_changeyby" => format!("change y by {}", self.num_input(block, "DY")),
            "motion_sety" => format!("set y to {}", self.num_input(block, "Y")),
            "motion_ifonedgebounce" => "if on edge, bounce".into(),
            "motion_setrotationstyle" => {
                format!("set rotation style {}", field_menu(block, "STYLE"))
            }

            // looks
            "looks_say" => format!("say {}", self.text_input(block, "MESSAGE")),
            "looks_sayforsecs" => format!(
                "say {} for {} seconds",
                self.text_input(block, "MESSAGE"),
                self.num_input(block, "SECS")
            ),
            "looks_think" => format!("think {}", self.text_input(block, "MESSAGE")),
            "looks_thinkforsecs" => format!(
                "think {} for {} seconds",
                self.text_input(block, "MESSAGE"),
                self.num_input(block, "SECS")
            ),
            "looks_show" => "show".into(),
            "looks_hide" => "hide".into(),
            "looks_switchcostumeto" => {
                format!("switch costume to {}", self.menu_input(block, "COSTUME"))
            }
            "looks_nextcostume" => "next costume".into(),
            "looks_switchbackdropto" => {
                format!("switch backdrop to {}", self.menu_input(block, "BACKDROP"))
            }
            "looks_switchbackdroptoandwait" => format!(
                "switch backdrop to {} and wait",
                self.menu_input(block, "BACKDROP")
            ),
            "looks_nextbackdrop" => "next backdrop".into(),
            "looks_changesizeby" => {
                format!("change size by {}", self.num_input(block, "CHANGE"))
            }
            "looks_setsizeto" => format!("set size to {} %", self.num_input(block, "SIZE")),
            "looks_changeeffectby" => format!(
                "change {} effect by {}",
                field_menu(block, "EFFECT"),
                self.num_input(block, "CHANGE")
            ),
            "looks_seteffectto" => format!(
                "set {} effect to {}",
                field_menu(block, "EFFECT"),
                self.num_input(block, "VALUE")
            ),
            "looks_cleargraphiceffects" => "clear graphic effects".into(),
            "looks_gotofrontback" => {
                format!("go to {} layer", field_menu(block, "FRONT_BACK"))
            }
            "looks_goforwardbackwardlayers" => format!(
                "go {} {} layers",
                field_menu(block, "FORWARD_BACKWARD"),
                self.num_input(block, "NUM")
            ),

            // sound
            "sound_play" => format!("start sound {}", self.menu_input(block, "SOUND_MENU")),
            "sound_playuntildone" => format!(
                "play sound {} until done",
                self.menu_input(block, "SOUND_MENU")
            ),
            "sound_stopallsounds" => "stop all sounds".into(),
            "sound_changevolumeby" => {
                format!("change volume by {}", self.num_input(block, "VOLUME"))
            }
            "sound_setvolumeto" => {
                format!("set volume to {} %", self.num_input(block, "VOLUME"))
            }

            // custom procedures
            opcodes::PROCEDURES_DEFINITION => format!("define {}", self.prototype_text(block)),
            "procedures_call" => format!("{}::custom", self.call_text(block)),

            _ => self.generic_line(block),
        }
    }

    /// Reporter (expression) blocks, returned already wrapped in their
    /// shape brackets.
    fn reporter(&mut self, id: &str) -> String {
        if !self.visited.insert(id.to_string()) {
            return "()".into();
        }
        let Some(block) = self.blocks.get(id) else {
            return "()".into();
        };

        let text = match block.opcode.as_str() {
            "operator_add" => self.binary_num(block, "+"),
            "operator_subtract" => self.binary_num(block, "-"),
            "operator_multiply" => self.binary_num(block, "*"),
            "operator_divide" => self.binary_num(block, "/"),
            "operator_mod" => format!(
                "({} mod {})",
                self.num_input(block, "NUM1"),
                self.num_input(block, "NUM2")
            ),
            "operator_round" => format!("(round {})", self.num_input(block, "NUM")),
            "operator_random" => format!(
                "(pick random {} to {})",
                self.num_input(block, "FROM"),
                self.num_input(block, "TO")
            ),
            "operator_gt" => self.comparison(block, "\\>"),
            "operator_lt" => self.comparison(block, "\\<"),
            "operator_equals" => self.comparison(block, "="),
            "operator_and" => format!(
                "<{} and {}>",
                self.bool_input(block, "OPERAND1"),
                self.bool_input(block, "OPERAND2")
            ),
            "operator_or" => format!(
                "<{} or {}>",
                self.bool_input(block, "OPERAND1"),
                self.bool_input(block, "OPERAND2")
            ),
            "operator_not" => format!("<not {}>", self.bool_input(block, "OPERAND")),
            "operator_join" => format!(
                "(join {} {})",
                self.text_input(block, "STRING1"),
                self.text_input(block, "STRING2")
            ),
            "operator_letter_of" => format!(
                "(letter {} of {})",
                self.num_input(block, "LETTER"),
                self.text_input(block, "STRING")
            ),
            "operator_length" => {
                format!("(length of {})", self.text_input(block, "STRING"))
            }
            "operator_contains" => format!(
                "<{} contains {}?::operators>",
                self.text_input(block, "STRING1"),
                self.text_input(block, "STRING2")
            ),
            "operator_mathop" => format!(
                "({} of {}::operators)",
                field_menu(block, "OPERATOR"),
                self.num_input(block, "NUM")
            ),

            "sensing_answer" => "(answer)".into(),
            "sensing_loudness" => "(loudness)".into(),
            "sensing_timer" => "(timer)".into(),
            "sensing_username" => "(username)".into(),
            "sensing_mousex" => "(mouse x)".into(),
            "sensing_mousey" => "(mouse y)".into(),
            "sensing_mousedown" => "<mouse down?>".into(),
            "sensing_keypressed" => format!(
                "<key {} pressed?>",
                self.menu_input(block, "KEY_OPTION")
            ),
            "sensing_touchingobject" => format!(
                "<touching {}?>",
                self.menu_input(block, "TOUCHINGOBJECTMENU")
            ),
            "sensing_touchingcolor" => format!(
                "<touching color {}?>",
                self.text_input(block, "COLOR")
            ),
            "sensing_distanceto" => format!(
                "(distance to {})",
                self.menu_input(block, "DISTANCETOMENU")
            ),
            "sensing_of" => format!(
                "({} of {}::sensing)",
                field_menu(block, "PROPERTY"),
                self.menu_input(block, "OBJECT")
            ),
            "sensing_current" => {
                format!("(current {})", field_menu(block, "CURRENTMENU"))
            }
            "sensing_dayssince2000" => "(days since 2000)".into(),

            "motion_xposition" => "(x position)".into(),
            "motion_yposition" => "(y position)".into(),
            "motion_direction" => "(direction)".into(),
            "looks_size" => "(size)".into(),
            "looks_costumenumbername" => {
                format!("(costume {})", field_menu(block, "NUMBER_NAME"))
            }
            "looks_backdropnumbername" => {
                format!("(backdrop {})", field_menu(block, "NUMBER_NAME"))
            }
            "sound_volume" => "(volume)".into(),

            "data_variable" => format!(
                "({}::variables)",
                escape(block.field("VARIABLE").unwrap_or_default(), false)
            ),
            "data_listcontents" => format!(
                "({}::list)",
                escape(block.field("LIST").unwrap_or_default(), false)
            ),
            "data_itemoflist" => format!(
                "(item {} of {})",
                self.num_input(block, "INDEX"),
                field_menu(block, "LIST")
            ),
            "data_itemnumoflist" => format!(
                "(item # of {} in {})",
                self.text_input(block, "ITEM"),
                field_menu(block, "LIST")
            ),
            "data_lengthoflist" => {
                format!("(length of {})", field_menu(block, "LIST"))
            }
            "data_listcontainsitem" => format!(
                "<{} contains {}?>",
                field_menu(block, "LIST"),
                self.text_input(block, "ITEM")
            ),

            "argument_reporter_string_number" => format!(
                "({}::custom-arg)",
                escape(block.field("VALUE").unwrap_or_default(), false)
            ),
            "argument_reporter_boolean" => format!(
                "<{}::custom-arg>",
                escape(block.field("VALUE").unwrap_or_default(), false)
            ),

            // menu shadow blocks referenced directly from a slot
            _ if block.shadow => menu_option(block),

            _ => format!("({})", self.generic_line(block)),
        };
        self.visited.remove(id);
        text
    }

    fn binary_num(&mut self, block: &RawBlock, op: &str) -> String {
        format!(
            "({} {} {})",
            self.num_input(block, "NUM1"),
            op,
            self.num_input(block, "NUM2")
        )
    }

    fn comparison(&mut self, block: &RawBlock, op: &str) -> String {
        format!(
            "<{} {} {}>",
            self.text_input(block, "OPERAND1"),
            op,
            self.text_input(block, "OPERAND2")
        )
    }

    /// A slot rendered in numeric context: `(value)` for plain literals.
    fn num_input(&mut self, block: &RawBlock, name: &str) -> String {
        self.slot(block, name, SlotShape::Round)
    }

    /// A slot rendered in text context: `[value]` for plain literals.
    fn text_input(&mut self, block: &RawBlock, name: &str) -> String {
        self.slot(block, name, SlotShape::Square)
    }

    /// A boolean slot: `<>` when empty.
    fn bool_input(&mut self, block: &RawBlock, name: &str) -> String {
        match block.input(name).and_then(Input::block_id) {
            Some(id) => {
                let id = id.to_string();
                self.reporter(&id)
            }
            None => "<>".into(),
        }
    }

    /// A slot expected to hold a dropdown shadow block: `[option v]`.
    fn menu_input(&mut self, block: &RawBlock, name: &str) -> String {
        let Some(input) = block.input(name) else {
            return "[ v]".into();
        };
        if let Some(lit) = input.literal() {
            return format!("[{} v]", escape(lit.name(), false));
        }
        match input.block_id() {
            Some(id) => {
                let id = id.to_string();
                self.reporter(&id)
            }
            None => "[ v]".into(),
        }
    }

    /// Broadcast slots carry a broadcast literal or a reporter.
    fn broadcast_input(&mut self, block: &RawBlock) -> String {
        let Some(input) = block.input("BROADCAST_INPUT") else {
            return "[ v]".into();
        };
        if let Some(Literal::Broadcast(name)) = input.literal() {
            return format!("[{} v]", escape(&name, false));
        }
        match input.block_id() {
            Some(id) => {
                let id = id.to_string();
                self.reporter(&id)
            }
            None => "[ v]".into(),
        }
    }

    fn slot(&mut self, block: &RawBlock, name: &str, shape: SlotShape) -> String {
        let empty = match shape {
            SlotShape::Round => "()",
            SlotShape::Square => "[]",
        };
        let Some(input) = block.input(name) else {
            return empty.into();
        };
        if let Some(lit) = input.literal() {
            return match lit {
                Literal::Variable(name) => format!("({}::variables)", escape(&name, false)),
                Literal::List(name) => format!("({}::list)", escape(&name, false)),
                Literal::Broadcast(name) => format!("[{} v]", escape(&name, false)),
                other => match shape {
                    SlotShape::Round => format!("({})", escape(other.name(), false)),
                    SlotShape::Square => format!("[{}]", escape(other.name(), false)),
                },
            };
        }
        match input.block_id() {
            Some(id) => {
                let id = id.to_string();
                self.reporter(&id)
            }
            None => empty.into(),
        }
    }

    /// `define` line built from the prototype the definition hat carries.
    fn prototype_text(&mut self, block: &RawBlock) -> String {
        let prototype = block
            .input("custom_block")
            .and_then(Input::block_id)
            .and_then(|id| self.blocks.get(id));
        let Some(prototype) = prototype else {
            return String::new();
        };
        let names = prototype
            .mutation
            .as_ref()
            .map(|m| m.argument_names())
            .unwrap_or_default();
        let mut next_arg = 0usize;
        signature_tokens(prototype.proccode().unwrap_or_default(), |marker| {
            let name = names.get(next_arg).cloned().unwrap_or_default();
            next_arg += 1;
            match marker {
                "%b" => format!("<{}>", escape(&name, false)),
                _ => format!("[{}]", escape(&name, false)),
            }
        })
    }

    /// Call line: signature with argument slots filled from the call's
    /// inputs, matched up by argument id order.
    fn call_text(&mut self, block: &RawBlock) -> String {
        let ids = block
            .mutation
            .as_ref()
            .map(|m| m.argument_ids())
            .unwrap_or_default();
        let mut next_arg = 0usize;
        let proccode = block.proccode().unwrap_or_default().to_string();
        signature_tokens(&proccode, |marker| {
            let arg_id = ids.get(next_arg).cloned().unwrap_or_default();
            next_arg += 1;
            match marker {
                "%b" => self.bool_input(block, &arg_id),
                _ => self.slot(block, &arg_id, SlotShape::Square),
            }
        })
    }

    /// Fallback for opcodes outside the table: a label derived from the
    /// opcode plus its inputs in slot order.
    fn generic_line(&mut self, block: &RawBlock) -> String {
        let label = block
            .opcode
            .split_once('_')
            .map(|(_, rest)| rest.replace('_', " "))
            .unwrap_or_else(|| block.opcode.clone());
        let mut line = label;
        let slots: Vec<String> = block.inputs.keys().cloned().collect();
        for slot in slots {
            let rendered = self.slot(block, &slot, SlotShape::Square);
            line.push(' ');
            line.push_str(&rendered);
        }
        line
    }
}

enum SlotShape {
    Round,
    Square,
}

/// `[option v]` from the single field of a dropdown shadow block.
fn menu_option(block: &RawBlock) -> String {
    let option = block
        .fields
        .values()
        .next()
        .and_then(crate::raw::Field::option)
        .unwrap_or_default();
    format!("[{} v]", escape(option, false))
}

/// `[name v]` from a named field slot.
fn field_menu(block: &RawBlock, name: &str) -> String {
    format!("[{} v]", escape(block.field(name).unwrap_or_default(), false))
}

/// Expand a procedure signature, replacing `%s`/`%n`/`%b` markers through
/// `fill` and escaping the label tokens.
fn signature_tokens(proccode: &str, mut fill: impl FnMut(&str) -> String) -> String {
    let mut parts = Vec::new();
    for token in proccode.split_whitespace() {
        match token {
            "%s" | "%n" | "%b" => parts.push(fill(token)),
            label => parts.push(escape(label, false)),
        }
    }
    parts.join(" ")
}
