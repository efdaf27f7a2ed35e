//! Bridge from abstract controller events to the FMU's input variables.
//!
//! Input variables are partitioned by base type into [`TypedInputs`] buffers. The
//! [`InputChannelMap`] binds the eight abstract identifiers (two analog sticks, four digital
//! keys) to a `(base type, index)` slot in those buffers.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    str::FromStr,
};

use crate::{
    handle::{BaseType, Causality, FmuHandle, ValueRef, VariableInfo},
    FmiError, FmiRes,
};

/// Raw joystick values are 16-bit signed.
pub const DEFAULT_AXIS_SCALE: f64 = 32767.0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown input identifier {0}")]
    UnknownInput(String),

    #[error("{input} cannot be mapped to a {base_type} variable")]
    IncompatibleType { input: InputId, base_type: BaseType },

    #[error("No {base_type} input at index {index} ({len} available)")]
    IndexOutOfRange {
        base_type: BaseType,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputId {
    Joy1X,
    Joy1Y,
    Joy2X,
    Joy2Y,
    KeyW,
    KeyA,
    KeyS,
    KeyD,
}

impl InputId {
    pub const ANALOG: [InputId; 4] = [InputId::Joy1X, InputId::Joy1Y, InputId::Joy2X, InputId::Joy2Y];
    pub const DIGITAL: [InputId; 4] = [InputId::KeyW, InputId::KeyA, InputId::KeyS, InputId::KeyD];

    pub fn is_analog(self) -> bool {
        Self::ANALOG.contains(&self)
    }

    /// Analog axes drive real inputs, keys drive boolean inputs.
    pub fn base_type(self) -> BaseType {
        if self.is_analog() {
            BaseType::Real
        } else {
            BaseType::Boolean
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputId::Joy1X => "JOY_1_X",
            InputId::Joy1Y => "JOY_1_Y",
            InputId::Joy2X => "JOY_2_X",
            InputId::Joy2Y => "JOY_2_Y",
            InputId::KeyW => "KEY_W",
            InputId::KeyA => "KEY_A",
            InputId::KeyS => "KEY_S",
            InputId::KeyD => "KEY_D",
        }
    }
}

impl Display for InputId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ANALOG
            .into_iter()
            .chain(Self::DIGITAL)
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InputError::UnknownInput(s.to_owned()))
    }
}

/// A slot in one of the typed input buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputChannel {
    pub base_type: BaseType,
    pub index: usize,
}

/// Bidirectional map between abstract inputs and input slots, plus the keyboard scancode table.
///
/// Each identifier owns at most one slot and each slot has at most one owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputChannelMap {
    channels: BTreeMap<InputId, InputChannel>,
    scancodes: HashMap<u32, InputId>,
}

impl InputChannelMap {
    pub fn new(scancodes: impl IntoIterator<Item = (u32, InputId)>) -> Self {
        Self {
            channels: BTreeMap::new(),
            scancodes: scancodes.into_iter().collect(),
        }
    }

    pub fn get(&self, input: InputId) -> Option<InputChannel> {
        self.channels.get(&input).copied()
    }

    /// The identifier currently mapped to `channel`, if any.
    pub fn owner(&self, channel: InputChannel) -> Option<InputId> {
        self.channels
            .iter()
            .find_map(|(id, ch)| (*ch == channel).then_some(*id))
    }

    /// Map `input` to `channel`, overwriting its previous mapping. A different identifier
    /// holding `channel` is released and returned.
    pub fn assign(&mut self, input: InputId, channel: InputChannel) -> Option<InputId> {
        let released = self.owner(channel).filter(|owner| *owner != input);
        if let Some(owner) = released {
            self.channels.remove(&owner);
        }
        self.channels.insert(input, channel);
        released
    }

    pub fn remove(&mut self, input: InputId) -> Option<InputChannel> {
        self.channels.remove(&input)
    }

    pub fn input_for_scancode(&self, scancode: u32) -> Option<InputId> {
        self.scancodes.get(&scancode).copied()
    }

    pub fn set_scancode(&mut self, scancode: u32, input: InputId) {
        self.scancodes.insert(scancode, input);
    }

    pub fn iter(&self) -> impl Iterator<Item = (InputId, InputChannel)> + '_ {
        self.channels.iter().map(|(id, ch)| (*id, *ch))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    /// Divisor turning a raw axis value into the real input value
    pub axis_scale: f64,
    /// Raw keyboard scancode -> key identifier
    pub scancodes: Vec<(u32, InputId)>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            axis_scale: DEFAULT_AXIS_SCALE,
            scancodes: vec![
                (u32::from(b'w'), InputId::KeyW),
                (u32::from(b'a'), InputId::KeyA),
                (u32::from(b's'), InputId::KeyS),
                (u32::from(b'd'), InputId::KeyD),
            ],
        }
    }
}

/// An event produced by an input device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Raw value of a joystick axis
    Axis { input: InputId, raw: i32 },
    /// A key given by its abstract identifier
    Key { input: InputId, pressed: bool },
    /// A key given by its raw keyboard scancode
    Scancode { scancode: u32, pressed: bool },
}

/// Selects variables by causality and base type. Enumerations match an [`BaseType::Integer`]
/// filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableFilter {
    pub causality: Causality,
    pub base_type: BaseType,
}

impl VariableFilter {
    pub fn new(causality: Causality, base_type: BaseType) -> Self {
        Self {
            causality,
            base_type,
        }
    }

    /// `false` for a missing variable or any mismatch.
    pub fn matches(&self, var: Option<&VariableInfo>) -> bool {
        var.is_some_and(|var| {
            var.causality == self.causality
                && var.base_type.storage() == self.base_type.storage()
        })
    }
}

/// Value references, names and current values of the inputs of one base type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedInputs<T> {
    pub value_refs: Vec<ValueRef>,
    pub names: Vec<String>,
    pub values: Vec<T>,
}

impl<T: Default + Clone> TypedInputs<T> {
    fn collect<'a>(vars: impl Iterator<Item = &'a VariableInfo>) -> Self {
        let (value_refs, names): (Vec<_>, Vec<_>) = vars
            .map(|var| (var.value_reference, var.name.clone()))
            .unzip();
        let values = vec![T::default(); value_refs.len()];
        Self {
            value_refs,
            names,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.value_refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value_refs.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn reset(&mut self) {
        self.values.fill(T::default());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputData {
    reals: TypedInputs<f64>,
    integers: TypedInputs<i32>,
    booleans: TypedInputs<bool>,
    strings: TypedInputs<String>,
    channel_map: InputChannelMap,
    axis_scale: f64,
}

impl Default for InputData {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}

impl InputData {
    /// Empty buffers; used before a model is initialized.
    pub fn new(config: &InputConfig) -> Self {
        Self {
            reals: TypedInputs::default(),
            integers: TypedInputs::default(),
            booleans: TypedInputs::default(),
            strings: TypedInputs::default(),
            channel_map: InputChannelMap::new(config.scancodes.iter().copied()),
            axis_scale: config.axis_scale,
        }
    }

    /// Enumerate the input variables of `fmu`, allocate the value buffers and assign the first
    /// four real inputs to the analog axes and the first four boolean inputs to the keys.
    pub fn initialize_inputs<F: FmuHandle + ?Sized>(fmu: &F, config: &InputConfig) -> Self {
        let vars = fmu.variables();
        let select = |base_type| {
            let filter = VariableFilter::new(Causality::Input, base_type);
            vars.iter().filter(move |var| filter.matches(Some(*var)))
        };

        let mut inputs = Self {
            reals: TypedInputs::collect(select(BaseType::Real)),
            integers: TypedInputs::collect(select(BaseType::Integer)),
            booleans: TypedInputs::collect(select(BaseType::Boolean)),
            strings: TypedInputs::collect(select(BaseType::String)),
            ..Self::new(config)
        };

        for (input, index) in InputId::ANALOG.into_iter().zip(0..inputs.reals.len()) {
            inputs.channel_map.assign(
                input,
                InputChannel {
                    base_type: BaseType::Real,
                    index,
                },
            );
        }
        for (input, index) in InputId::DIGITAL.into_iter().zip(0..inputs.booleans.len()) {
            inputs.channel_map.assign(
                input,
                InputChannel {
                    base_type: BaseType::Boolean,
                    index,
                },
            );
        }

        log::debug!(
            "Found {} real, {} integer, {} boolean and {} string inputs, {} mapped",
            inputs.reals.len(),
            inputs.integers.len(),
            inputs.booleans.len(),
            inputs.strings.len(),
            inputs.channel_map.len()
        );
        for (input, channel) in inputs.channel_map.iter() {
            log::trace!("  {input} -> {}", inputs.name_of(channel).unwrap_or("?"));
        }

        inputs
    }

    /// Write all input buffers into the FMU, one bulk call per non-empty base type.
    ///
    /// Every call is issued even if an earlier one fails; the first error is returned afterwards.
    pub fn set_inputs_in_fmu<F: FmuHandle + ?Sized>(&self, fmu: &mut F) -> Result<FmiRes, FmiError> {
        let mut res = Ok(FmiRes::OK);
        let mut merge = |r: Result<FmiRes, FmiError>| match (&res, r) {
            (Err(_), _) => {}
            (_, Err(err)) => res = Err(err),
            (_, Ok(FmiRes::Warning)) => res = Ok(FmiRes::Warning),
            (_, Ok(FmiRes::OK)) => {}
        };
        if !self.reals.is_empty() {
            merge(fmu.set_real(&self.reals.value_refs, &self.reals.values));
        }
        if !self.integers.is_empty() {
            merge(fmu.set_integer(&self.integers.value_refs, &self.integers.values));
        }
        if !self.booleans.is_empty() {
            merge(fmu.set_boolean(&self.booleans.value_refs, &self.booleans.values));
        }
        if !self.strings.is_empty() {
            merge(fmu.set_string(&self.strings.value_refs, &self.strings.values));
        }
        res
    }

    pub fn reset_input_values(&mut self) {
        self.reals.reset();
        self.integers.reset();
        self.reset_discrete_input_values();
    }

    /// Clear the boolean and string inputs. Analog values persist.
    pub fn reset_discrete_input_values(&mut self) {
        self.booleans.reset();
        self.strings.reset();
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Axis { input, raw } => {
                if !input.is_analog() {
                    log::debug!("Ignoring axis event for {input}");
                    return;
                }
                let value = f64::from(raw) / self.axis_scale;
                match self.channel_map.get(input) {
                    Some(InputChannel {
                        base_type: BaseType::Real,
                        index,
                    }) => {
                        if let Some(slot) = self.reals.values.get_mut(index) {
                            *slot = value;
                        }
                    }
                    _ => log::debug!("{input} is not mapped"),
                }
            }
            InputEvent::Key { input, pressed } => self.set_key(input, pressed),
            InputEvent::Scancode { scancode, pressed } => {
                match self.channel_map.input_for_scancode(scancode) {
                    Some(input) => self.set_key(input, pressed),
                    None => log::debug!("No input bound to scancode {scancode}"),
                }
            }
        }
    }

    fn set_key(&mut self, input: InputId, pressed: bool) {
        match self.channel_map.get(input) {
            Some(InputChannel {
                base_type: BaseType::Boolean,
                index,
            }) => {
                if let Some(slot) = self.booleans.values.get_mut(index) {
                    *slot = pressed;
                }
            }
            _ => log::debug!("{input} is not mapped"),
        }
    }

    /// Remap `input` to the `index`-th input of `base_type`. Returns the identifier that
    /// previously owned that slot, which is now unmapped.
    pub fn map_channel(
        &mut self,
        input: InputId,
        base_type: BaseType,
        index: usize,
    ) -> Result<Option<InputId>, InputError> {
        let base_type = base_type.storage();
        if base_type != input.base_type() {
            return Err(InputError::IncompatibleType { input, base_type });
        }
        let len = self.len_of(base_type);
        if index >= len {
            return Err(InputError::IndexOutOfRange {
                base_type,
                index,
                len,
            });
        }

        let released = self
            .channel_map
            .assign(input, InputChannel { base_type, index });
        if let Some(released) = released {
            log::debug!("{released} released by remapping {input}");
        }
        Ok(released)
    }

    pub fn unmap_channel(&mut self, input: InputId) -> Option<InputChannel> {
        self.channel_map.remove(input)
    }

    pub fn channel_map(&self) -> &InputChannelMap {
        &self.channel_map
    }

    pub fn axis_scale(&self) -> f64 {
        self.axis_scale
    }

    pub fn reals(&self) -> &TypedInputs<f64> {
        &self.reals
    }

    pub fn integers(&self) -> &TypedInputs<i32> {
        &self.integers
    }

    pub fn booleans(&self) -> &TypedInputs<bool> {
        &self.booleans
    }

    pub fn strings(&self) -> &TypedInputs<String> {
        &self.strings
    }

    /// Direct access for callers that drive inputs without the channel map.
    pub fn integers_mut(&mut self) -> &mut [i32] {
        &mut self.integers.values
    }

    pub fn strings_mut(&mut self) -> &mut [String] {
        &mut self.strings.values
    }

    /// Variable name behind a slot.
    pub fn name_of(&self, channel: InputChannel) -> Option<&str> {
        let names = match channel.base_type.storage() {
            BaseType::Real => &self.reals.names,
            BaseType::Integer => &self.integers.names,
            BaseType::Boolean => &self.booleans.names,
            BaseType::String => &self.strings.names,
            BaseType::Enumeration => return None,
        };
        names.get(channel.index).map(String::as_str)
    }

    fn len_of(&self, base_type: BaseType) -> usize {
        match base_type.storage() {
            BaseType::Real => self.reals.len(),
            BaseType::Integer => self.integers.len(),
            BaseType::Boolean => self.booleans.len(),
            BaseType::String => self.strings.len(),
            BaseType::Enumeration => 0,
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.reals.len() + self.integers.len() + self.booleans.len() + self.strings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, vr: ValueRef, causality: Causality, base_type: BaseType) -> VariableInfo {
        VariableInfo {
            name: name.to_owned(),
            value_reference: vr,
            causality,
            base_type,
            description: None,
        }
    }

    #[test]
    fn test_input_id_names() {
        assert_eq!("JOY_2_Y".parse::<InputId>(), Ok(InputId::Joy2Y));
        assert_eq!("key_w".parse::<InputId>(), Ok(InputId::KeyW));
        assert_eq!(
            "JOY_3_X".parse::<InputId>(),
            Err(InputError::UnknownInput("JOY_3_X".to_owned()))
        );
        assert_eq!(InputId::KeyD.to_string(), "KEY_D");
        assert_eq!(InputId::Joy1X.base_type(), BaseType::Real);
        assert_eq!(InputId::KeyA.base_type(), BaseType::Boolean);
    }

    #[test]
    fn test_variable_filter() {
        let filter = VariableFilter::new(Causality::Input, BaseType::Integer);
        assert!(!filter.matches(None));
        assert!(filter.matches(Some(&var("gear", 1, Causality::Input, BaseType::Enumeration))));
        assert!(filter.matches(Some(&var("n", 2, Causality::Input, BaseType::Integer))));
        assert!(!filter.matches(Some(&var("n", 2, Causality::Output, BaseType::Integer))));
        assert!(!filter.matches(Some(&var("x", 3, Causality::Input, BaseType::Real))));
    }

    #[test]
    fn test_channel_map_is_bidirectional() {
        let mut map = InputChannelMap::default();
        let slot0 = InputChannel {
            base_type: BaseType::Real,
            index: 0,
        };
        let slot1 = InputChannel {
            base_type: BaseType::Real,
            index: 1,
        };

        assert_eq!(map.assign(InputId::Joy1X, slot0), None);
        assert_eq!(map.assign(InputId::Joy1Y, slot1), None);

        // Remapping overwrites rather than merges
        assert_eq!(map.assign(InputId::Joy1X, slot1), Some(InputId::Joy1Y));
        assert_eq!(map.get(InputId::Joy1X), Some(slot1));
        assert_eq!(map.get(InputId::Joy1Y), None);
        assert_eq!(map.owner(slot0), None);
        assert_eq!(map.owner(slot1), Some(InputId::Joy1X));
        assert_eq!(map.len(), 1);

        // Re-assigning the same slot to its owner releases nobody
        assert_eq!(map.assign(InputId::Joy1X, slot1), None);
    }

    #[test]
    fn test_default_scancodes() {
        let inputs = InputData::default();
        let map = inputs.channel_map();
        assert_eq!(map.input_for_scancode(u32::from(b'w')), Some(InputId::KeyW));
        assert_eq!(map.input_for_scancode(u32::from(b'd')), Some(InputId::KeyD));
        assert_eq!(map.input_for_scancode(u32::from(b'q')), None);
        assert_eq!(inputs.axis_scale(), DEFAULT_AXIS_SCALE);
    }

    #[test]
    fn test_events_without_mapping_are_ignored() {
        let mut inputs = InputData::default();
        inputs.apply(InputEvent::Axis {
            input: InputId::Joy1X,
            raw: 100,
        });
        inputs.apply(InputEvent::Scancode {
            scancode: u32::from(b'w'),
            pressed: true,
        });
        assert_eq!(inputs.num_inputs(), 0);
        assert_eq!(
            inputs.map_channel(InputId::Joy1X, BaseType::Real, 0),
            Err(InputError::IndexOutOfRange {
                base_type: BaseType::Real,
                index: 0,
                len: 0
            })
        );
        assert_eq!(
            inputs.map_channel(InputId::KeyW, BaseType::Real, 0),
            Err(InputError::IncompatibleType {
                input: InputId::KeyW,
                base_type: BaseType::Real
            })
        );
    }
}
