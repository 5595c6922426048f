//! NestOS syscall ABI shared by the kernel and userspace.
//!
//! Everything here is plain data: syscall numbers, the process state codes
//! and the fixed-layout `ProcessInfo` record that `SYS_PS_INFO` writes into
//! user memory.
#![cfg_attr(not(test), no_std)]

// ── Syscall numbers ─────────────────────────────────────────────

/// Syscall numbers for the process introspection calls.
///
/// Every call returns `ERR` (`-1` as a signed word) on failure.
pub mod nr {
    /// `sys_getpid()`: caller's namespace-relative process id.
    pub const SYS_GETPID: u64 = 20;
    /// `sys_getppid()`: caller's namespace-relative parent id (0 for the root process).
    pub const SYS_GETPPID: u64 = 21;
    /// `sys_ps_list(limit: i32, pids_ptr: *mut i32)`: visible pids, returns the total count.
    pub const SYS_PS_LIST: u64 = 22;
    /// `sys_ps_info(pid: i32, info_ptr: *mut ProcessInfo)`: snapshot of one process.
    pub const SYS_PS_INFO: u64 = 23;
}

/// Return value of a failed syscall.
pub const ERR: u64 = u64::MAX;

/// Size of one pid entry written by `SYS_PS_LIST`.
pub const PID_SIZE: usize = core::mem::size_of::<i32>();

// ── Process state ───────────────────────────────────────────────

/// Maximum process name length, including the terminating NUL.
pub const PROC_NAME_LEN: usize = 16;

/// Scheduling state of a process slot.
///
/// The discriminants are the wire codes carried in `ProcessInfo::state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ProcState {
    /// Slot is free.
    Unused = 0,
    /// Slot is claimed but the process has not been made runnable yet.
    Allocated = 1,
    Sleeping = 2,
    Runnable = 3,
    Running = 4,
    /// Exited, waiting for the parent to collect it.
    Zombie = 5,
}

impl ProcState {
    /// Decode a wire state code.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Unused),
            1 => Some(Self::Allocated),
            2 => Some(Self::Sleeping),
            3 => Some(Self::Runnable),
            4 => Some(Self::Running),
            5 => Some(Self::Zombie),
            _ => None,
        }
    }

    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Fixed-width (8 column) token used by `ps list`.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Unused => "UNUSED  ",
            Self::Allocated => "USED    ",
            Self::Sleeping => "SLEEPING",
            Self::Runnable => "RUNNABLE",
            Self::Running => "RUNNING ",
            Self::Zombie => "ZOMBIE  ",
        }
    }
}

// ── Process names ───────────────────────────────────────────────

/// Copy `name` into a NUL-padded name field.
///
/// Names longer than `PROC_NAME_LEN - 1` bytes are truncated at a char
/// boundary so the field always stays valid UTF-8 and NUL terminated.
pub fn encode_name(name: &str) -> [u8; PROC_NAME_LEN] {
    let mut end = name.len().min(PROC_NAME_LEN - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = [0u8; PROC_NAME_LEN];
    out[..end].copy_from_slice(&name.as_bytes()[..end]);
    out
}

/// View a NUL-padded name field as a string (up to the first NUL).
pub fn decode_name(raw: &[u8; PROC_NAME_LEN]) -> &str {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(PROC_NAME_LEN);
    match core::str::from_utf8(&raw[..len]) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or(""),
    }
}

// ── ProcessInfo ─────────────────────────────────────────────────

/// Snapshot of one process, as written by `SYS_PS_INFO`.
///
/// Wire layout (native endian, no padding, `ProcessInfo::SIZE` bytes):
///
/// | offset | field        |
/// |--------|--------------|
/// | 0      | `name[16]`   |
/// | 16     | `state`      |
/// | 20     | `ppid`       |
/// | 24     | `nmspace_id` |
/// | 28     | `getpid`     |
/// | 32     | `getppid`    |
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessInfo {
    pub name: [u8; PROC_NAME_LEN],
    /// `ProcState` wire code.
    pub state: u32,
    /// Raw pid of the parent, 0 for the root process.
    pub ppid: i32,
    pub nmspace_id: i32,
    /// Namespace-relative id of the process itself.
    pub getpid: i32,
    /// Namespace-relative id of the parent, 0 for the root process.
    pub getppid: i32,
}

impl ProcessInfo {
    pub const SIZE: usize = PROC_NAME_LEN + 5 * 4;

    pub const fn empty() -> Self {
        Self {
            name: [0; PROC_NAME_LEN],
            state: 0,
            ppid: 0,
            nmspace_id: 0,
            getpid: 0,
            getppid: 0,
        }
    }

    pub fn name(&self) -> &str {
        decode_name(&self.name)
    }

    pub fn proc_state(&self) -> Option<ProcState> {
        ProcState::from_code(self.state)
    }

    /// Serialize into the wire layout.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..PROC_NAME_LEN].copy_from_slice(&self.name);
        let words = [
            self.state.to_ne_bytes(),
            self.ppid.to_ne_bytes(),
            self.nmspace_id.to_ne_bytes(),
            self.getpid.to_ne_bytes(),
            self.getppid.to_ne_bytes(),
        ];
        for (i, word) in words.iter().enumerate() {
            let at = PROC_NAME_LEN + i * 4;
            out[at..at + 4].copy_from_slice(word);
        }
        out
    }

    /// Parse the wire layout.
    pub fn from_bytes(raw: &[u8; Self::SIZE]) -> Self {
        let word = |i: usize| {
            let at = PROC_NAME_LEN + i * 4;
            [raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]
        };
        let mut name = [0u8; PROC_NAME_LEN];
        name.copy_from_slice(&raw[..PROC_NAME_LEN]);
        Self {
            name,
            state: u32::from_ne_bytes(word(0)),
            ppid: i32::from_ne_bytes(word(1)),
            nmspace_id: i32::from_ne_bytes(word(2)),
            getpid: i32::from_ne_bytes(word(3)),
            getppid: i32::from_ne_bytes(word(4)),
        }
    }
}

const _: () = assert!(core::mem::size_of::<ProcessInfo>() == ProcessInfo::SIZE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_tokens_are_eight_columns() {
        for code in 0..6 {
            let state = ProcState::from_code(code).unwrap();
            assert_eq!(state.code(), code);
            assert_eq!(state.token().len(), 8);
        }
        assert_eq!(ProcState::from_code(6), None);
    }

    #[test]
    fn long_names_are_truncated_and_terminated() {
        let raw = encode_name("a-very-long-process-name");
        assert_eq!(raw[PROC_NAME_LEN - 1], 0);
        assert_eq!(decode_name(&raw), "a-very-long-pro");

        // A multi-byte char straddling the limit is dropped whole.
        let raw = encode_name("abcdefghijklmn\u{e9}");
        assert_eq!(decode_name(&raw), "abcdefghijklmn");
    }

    #[test]
    fn info_wire_layout_matches_offsets() {
        let info = ProcessInfo {
            name: encode_name("sh"),
            state: ProcState::Sleeping.code(),
            ppid: 10,
            nmspace_id: 1,
            getpid: 1,
            getppid: 0,
        };
        let raw = info.to_bytes();
        assert_eq!(&raw[..2], b"sh");
        assert_eq!(i32::from_ne_bytes([raw[20], raw[21], raw[22], raw[23]]), 10);
        assert_eq!(ProcessInfo::from_bytes(&raw), info);
        assert_eq!(info.proc_state(), Some(ProcState::Sleeping));
    }
}
