//! Double-buffer role bookkeeping
//!
//! Two state buffers alternate between being read (`current`) and written
//! (`next`). Neither buffer is ever both at once.

/// Which of the two buffers is read and which is written this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRoles {
    current: usize,
    next: usize,
}

impl Default for BufferRoles {
    fn default() -> Self {
        Self {
            current: 0,
            next: 1,
        }
    }
}

impl BufferRoles {
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn next(&self) -> usize {
        self.next
    }

    /// Exchange roles: the buffer just written becomes the one read
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

/// A pair of owned buffers with alternating roles
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    buffers: [T; 2],
    roles: BufferRoles,
}

impl<T> PingPong<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            buffers: [first, second],
            roles: BufferRoles::default(),
        }
    }

    pub fn roles(&self) -> BufferRoles {
        self.roles
    }

    pub fn current(&self) -> &T {
        &self.buffers[self.roles.current]
    }

    /// Borrow the read buffer and the write buffer together
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.buffers;
        if self.roles.current == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        }
    }

    pub fn swap(&mut self) {
        self.roles.swap();
    }
}
