//! The upstream traits implemented on top of the VSScript library.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr::{self, NonNull};
use std::slice;

use tracing::warn;
use vapoursynth_sys as ffi;

use crate::api::{OutputNode, PlaneRef, ScriptEnvironment, ScriptRuntime, SourceFrame};
use crate::video_info::{FormatInfo, NodeInfo};

/// Size of the buffer receiving frame generation errors.
const ERROR_BUF_SIZE: usize = 1024;

/// The process-wide VSScript library.
#[derive(Debug, Clone, Copy, Default)]
pub struct VSScript;

/// A wrapper for the VapourSynth API.
#[derive(Debug, Clone, Copy)]
pub struct API {
    // Note that this is *const, not *mut.
    handle: NonNull<ffi::VSAPI>,
}

impl API {
    #[inline]
    fn handle(&self) -> &ffi::VSAPI {
        unsafe { self.handle.as_ref() }
    }
}

impl ScriptRuntime for VSScript {
    type Api = API;
    type Environment = Environment;

    #[inline]
    fn init(&self) -> bool {
        unsafe { ffi::vsscript_init() != 0 }
    }

    #[inline]
    fn finalize(&self) {
        unsafe {
            ffi::vsscript_finalize();
        }
    }

    #[inline]
    fn api(&self) -> Option<API> {
        let handle = unsafe { ffi::vsscript_getVSApi() } as *mut ffi::VSAPI;
        NonNull::new(handle).map(|handle| API { handle })
    }

    fn evaluate(&self, api: &API, script: &str, file_name: &str) -> Result<Environment, String> {
        let script = CString::new(script).map_err(|e| e.to_string())?;
        let file_name = CString::new(file_name).map_err(|e| e.to_string())?;

        let mut handle: *mut ffi::VSScript = ptr::null_mut();
        let rv = unsafe {
            ffi::vsscript_evaluateScript(&mut handle, script.as_ptr(), file_name.as_ptr(), 0)
        };

        // The script handle is created even when evaluation fails.
        let environment = NonNull::new(handle).map(|handle| Environment { handle, api: *api });

        match environment {
            Some(environment) if rv == 0 => Ok(environment),
            Some(environment) => Err(environment.error()),
            None => Err("failed to create the script environment".to_owned()),
        }
    }
}

/// A VSScript environment holding an evaluated script.
#[derive(Debug)]
pub struct Environment {
    handle: NonNull<ffi::VSScript>,
    api: API,
}

impl Drop for Environment {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            ffi::vsscript_freeScript(self.handle.as_ptr());
        }
    }
}

impl Environment {
    /// Retrieves the VSScript error message.
    fn error(&self) -> String {
        let message = unsafe { ffi::vsscript_getError(self.handle.as_ptr()) };
        if message.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(message) }
                .to_string_lossy()
                .into_owned()
        }
    }
}

impl ScriptEnvironment for Environment {
    type Node = Node;

    fn output(&self, index: i32) -> Option<Node> {
        let handle = unsafe { ffi::vsscript_getOutput(self.handle.as_ptr(), index) };
        NonNull::new(handle).map(|handle| Node {
            handle,
            api: self.api,
        })
    }
}

/// A reference to an output node.
#[derive(Debug)]
pub struct Node {
    handle: NonNull<ffi::VSNodeRef>,
    api: API,
}

impl Drop for Node {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            (self.api.handle().freeNode)(self.handle.as_ptr());
        }
    }
}

impl OutputNode for Node {
    type Frame = Frame;

    fn info(&self) -> NodeInfo {
        let vi = unsafe { &*(self.api.handle().getVideoInfo)(self.handle.as_ptr()) };
        let format = unsafe { vi.format.as_ref() }.map(|format| FormatInfo {
            id: format.id,
            plane_count: format.numPlanes as usize,
            bytes_per_sample: format.bytesPerSample as usize,
        });

        NodeInfo {
            format,
            fps_num: vi.fpsNum,
            fps_den: vi.fpsDen,
            width: vi.width,
            height: vi.height,
            num_frames: vi.numFrames,
        }
    }

    fn get_frame(&self, n: usize) -> Option<Frame> {
        let n = i32::try_from(n).ok()?;
        let mut err_buf = [0 as c_char; ERROR_BUF_SIZE];

        let handle = unsafe {
            (self.api.handle().getFrame)(
                n,
                self.handle.as_ptr(),
                err_buf.as_mut_ptr(),
                ERROR_BUF_SIZE as i32,
            )
        };

        match NonNull::new(handle as *mut ffi::VSFrameRef) {
            Some(handle) => Some(Frame {
                handle,
                api: self.api,
            }),
            None => {
                let message = unsafe { CStr::from_ptr(err_buf.as_ptr()) };
                warn!("getFrame({}) failed: {}", n, message.to_string_lossy());
                None
            }
        }
    }
}

/// A reference to a generated frame.
#[derive(Debug)]
pub struct Frame {
    handle: NonNull<ffi::VSFrameRef>,
    api: API,
}

impl Drop for Frame {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            (self.api.handle().freeFrame)(self.handle.as_ptr());
        }
    }
}

impl SourceFrame for Frame {
    fn plane(&self, plane: usize) -> PlaneRef<'_> {
        let api = self.api.handle();
        let frame = self.handle.as_ptr();
        let plane = plane as i32;

        unsafe {
            let stride = (api.getStride)(frame, plane) as usize;
            let height = (api.getFrameHeight)(frame, plane) as usize;
            let data = (api.getReadPtr)(frame, plane);

            // The plane lives as long as the frame reference.
            PlaneRef::new(slice::from_raw_parts(data, stride * height), stride)
        }
    }
}
