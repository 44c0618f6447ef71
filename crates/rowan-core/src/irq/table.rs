//! Interrupt descriptor table, action chains, and flow handlers.

use bitflags::bitflags;
use planck_noalloc::vec::ArrayVec;

use crate::id::{DevId, HwIrq, Virq};

use super::IrqError;
use super::chip::{ChainedHandler, IrqChip};

/// Size of the virtual interrupt number space.
pub const NR_IRQS: usize = 128;

/// Capacity of the shared action pool.
///
/// Two actions per line covers every realistic sharing pattern on this
/// SoC. Pool slots are bump-allocated and never returned; releasing a
/// registration only unlinks it from its descriptor's chain.
pub const ACTION_POOL_CAPACITY: usize = NR_IRQS * 2;

bitflags! {
    /// Registration flags for [`IrqTable::request`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActionFlags: u32 {
        /// The line may be shared by several devices.
        const SHARED = 1 << 0;
        /// The handler drives the system tick.
        const TIMER = 1 << 1;
        /// The line is banked per CPU on the local controller.
        const PER_CPU = 1 << 2;
    }
}

/// Result of one action handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// The device was not the source of the interrupt.
    None,
    /// The interrupt was handled.
    Handled,
}

/// An action handler: receives the hardware line number and the token
/// supplied at registration.
pub type IrqHandler = fn(HwIrq, DevId) -> IrqReturn;

/// How dispatch drives a line once its descriptor is resolved.
#[derive(Clone, Copy)]
pub enum FlowHandler {
    /// Run the action chain directly. For lines with no special
    /// masking protocol, such as the per-CPU local controller's.
    Simple,
    /// Mask and acknowledge before running the chain, unmask after.
    /// Prevents a level-triggered line from re-firing mid-handler.
    Level,
    /// The line multiplexes a secondary controller; hand the locked
    /// table to its scan-and-redispatch hook instead of running actions.
    Chained(&'static dyn ChainedHandler),
}

/// One registered handler on a line.
#[derive(Clone, Copy)]
struct Action {
    handler: IrqHandler,
    dev: DevId,
    flags: ActionFlags,
    /// Pool index of the next action on the same line.
    next: Option<u16>,
}

/// Per-line dispatch state.
struct IrqDesc {
    hwirq: HwIrq,
    chip: Option<&'static dyn IrqChip>,
    flow: Option<FlowHandler>,
    /// Pool index of the head of the action chain.
    action: Option<u16>,
    /// Number of times this line has been dispatched.
    count: u64,
}

impl IrqDesc {
    const fn empty() -> Self {
        Self {
            hwirq: HwIrq::new(0),
            chip: None,
            flow: None,
            action: None,
            count: 0,
        }
    }
}

/// The global interrupt descriptor table and action pool.
///
/// All mutation happens under one IRQ-masking lock (see
/// [`super::with_table`]), so a second core entering bring-up or
/// dispatch serializes behind the first. Action handlers run with the
/// table locked and must not call back into the registration API.
pub struct IrqTable {
    descs: [IrqDesc; NR_IRQS],
    pool: ArrayVec<Action, ACTION_POOL_CAPACITY>,
    /// Dispatches that resolved to no descriptor or no flow handler.
    spurious: u64,
}

impl IrqTable {
    /// Creates an empty table. Call [`reset`](Self::reset) before use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            descs: [const { IrqDesc::empty() }; NR_IRQS],
            pool: ArrayVec::new(),
            spurious: 0,
        }
    }

    /// Resets every descriptor to its unbound state.
    ///
    /// Each descriptor's hardware number defaults to its own index;
    /// [`bind`](Self::bind) overrides it for offset-mapped controllers.
    pub fn reset(&mut self) {
        for (i, desc) in self.descs.iter_mut().enumerate() {
            *desc = IrqDesc::empty();
            desc.hwirq = HwIrq::new(i as u32);
        }
        self.pool.clear();
        self.spurious = 0;
    }

    fn index(&self, virq: Virq) -> Result<usize, IrqError> {
        let idx = virq.as_usize();
        if idx < NR_IRQS {
            Ok(idx)
        } else {
            Err(IrqError::InvalidIrq)
        }
    }

    /// Binds a virtual line to a controller.
    ///
    /// Records which hardware line of which controller the virtual
    /// number stands for, and how dispatch should drive it. Chip
    /// operations on this line will receive `hwirq`, not `virq`.
    pub fn bind(
        &mut self,
        virq: Virq,
        hwirq: HwIrq,
        chip: &'static dyn IrqChip,
        flow: FlowHandler,
    ) -> Result<(), IrqError> {
        let idx = self.index(virq)?;
        let desc = &mut self.descs[idx];
        desc.hwirq = hwirq;
        desc.chip = Some(chip);
        desc.flow = Some(flow);
        Ok(())
    }

    /// Installs a chained flow on an already-bound parent line.
    pub fn set_chained(
        &mut self,
        virq: Virq,
        handler: &'static dyn ChainedHandler,
    ) -> Result<(), IrqError> {
        let idx = self.index(virq)?;
        let desc = &mut self.descs[idx];
        if desc.chip.is_none() {
            return Err(IrqError::NotBound);
        }
        desc.flow = Some(FlowHandler::Chained(handler));
        Ok(())
    }

    /// Registers an action handler on a line.
    ///
    /// New actions are inserted at the head of the chain, so the most
    /// recent registration is consulted first on a shared line. Fails
    /// with [`IrqError::PoolExhausted`] when the fixed action pool is
    /// full.
    pub fn request(
        &mut self,
        virq: Virq,
        handler: IrqHandler,
        flags: ActionFlags,
        dev: DevId,
    ) -> Result<(), IrqError> {
        let idx = self.index(virq)?;
        let slot = self.pool.len();
        self.pool
            .try_push(Action {
                handler,
                dev,
                flags,
                next: self.descs[idx].action,
            })
            .map_err(|_| IrqError::PoolExhausted)?;
        self.descs[idx].action = Some(slot as u16);
        Ok(())
    }

    /// Removes the registration whose token matches `dev`.
    ///
    /// Only unlinks the action from the chain; the pool slot itself is
    /// never reclaimed. A token with no match leaves the chain alone.
    pub fn release(&mut self, virq: Virq, dev: DevId) {
        let Ok(idx) = self.index(virq) else {
            return;
        };
        let mut link = self.descs[idx].action;
        let mut prev: Option<u16> = None;
        while let Some(slot) = link {
            let action = self.pool[slot as usize];
            if action.dev == dev {
                match prev {
                    Some(p) => self.pool[p as usize].next = action.next,
                    None => self.descs[idx].action = action.next,
                }
                return;
            }
            prev = Some(slot);
            link = action.next;
        }
    }

    /// Unmasks the line at its controller. No-op if unbound.
    pub fn enable(&mut self, virq: Virq) {
        let Ok(idx) = self.index(virq) else {
            return;
        };
        let desc = &self.descs[idx];
        if let Some(chip) = desc.chip {
            chip.unmask(desc.hwirq);
        }
    }

    /// Masks the line at its controller. No-op if unbound.
    pub fn disable(&mut self, virq: Virq) {
        let Ok(idx) = self.index(virq) else {
            return;
        };
        let desc = &self.descs[idx];
        if let Some(chip) = desc.chip {
            chip.mask(desc.hwirq);
        }
    }

    /// Dispatches one interrupt through the line's flow handler.
    ///
    /// The service counter is incremented for every in-range dispatch;
    /// out-of-range numbers and lines with no flow handler are counted
    /// as spurious and otherwise ignored.
    pub fn dispatch(&mut self, virq: Virq) {
        let Ok(idx) = self.index(virq) else {
            self.spurious += 1;
            return;
        };
        self.descs[idx].count += 1;
        let Some(flow) = self.descs[idx].flow else {
            self.spurious += 1;
            return;
        };
        match flow {
            FlowHandler::Simple => {
                self.handle_irq_event(virq);
            }
            FlowHandler::Level => {
                let chip = self.descs[idx].chip;
                let hwirq = self.descs[idx].hwirq;
                if let Some(chip) = chip {
                    chip.mask(hwirq);
                    chip.ack(hwirq);
                }
                self.handle_irq_event(virq);
                if let Some(chip) = chip {
                    chip.unmask(hwirq);
                }
            }
            FlowHandler::Chained(handler) => handler.handle(self),
        }
    }

    /// Walks the line's action chain, most recent registration first.
    ///
    /// Every action runs; the results are OR-ed so the line counts as
    /// handled if any device on it claimed the interrupt.
    pub fn handle_irq_event(&mut self, virq: Virq) -> IrqReturn {
        let Ok(idx) = self.index(virq) else {
            return IrqReturn::None;
        };
        let hwirq = self.descs[idx].hwirq;
        let mut link = self.descs[idx].action;
        let mut ret = IrqReturn::None;
        while let Some(slot) = link {
            let Action {
                handler, dev, next, ..
            } = self.pool[slot as usize];
            if handler(hwirq, dev) == IrqReturn::Handled {
                ret = IrqReturn::Handled;
            }
            link = next;
        }
        ret
    }

    /// Counts a hardware-level spurious interrupt (empty pending state).
    pub fn note_spurious(&mut self) {
        self.spurious += 1;
    }

    /// Number of times the line has been dispatched.
    #[must_use]
    pub fn fire_count(&self, virq: Virq) -> u64 {
        self.index(virq).map_or(0, |idx| self.descs[idx].count)
    }

    /// Number of actions currently linked on the line.
    #[must_use]
    pub fn action_count(&self, virq: Virq) -> usize {
        let Ok(idx) = self.index(virq) else {
            return 0;
        };
        let mut n = 0;
        let mut link = self.descs[idx].action;
        while let Some(slot) = link {
            n += 1;
            link = self.pool[slot as usize].next;
        }
        n
    }

    /// Union of the registration flags of every action on the line.
    #[must_use]
    pub fn action_flags(&self, virq: Virq) -> ActionFlags {
        let Ok(idx) = self.index(virq) else {
            return ActionFlags::empty();
        };
        let mut flags = ActionFlags::empty();
        let mut link = self.descs[idx].action;
        while let Some(slot) = link {
            flags |= self.pool[slot as usize].flags;
            link = self.pool[slot as usize].next;
        }
        flags
    }

    /// Total spurious dispatches observed.
    #[must_use]
    pub fn spurious_count(&self) -> u64 {
        self.spurious
    }

    /// Name of the controller bound to the line, if any.
    #[must_use]
    pub fn chip_name(&self, virq: Virq) -> Option<&'static str> {
        let idx = self.index(virq).ok()?;
        self.descs[idx].chip.map(IrqChip::name)
    }
}

impl Default for IrqTable {
    fn default() -> Self {
        Self::new()
    }
}
